/// Splits documents into passages that respect paragraph, then line, then
/// word boundaries before falling back to a hard cut.
pub struct TextSplitter {
    chunk_size: usize,
    separators: Vec<&'static str>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            separators: vec!["\n\n", "\n", " "],
        }
    }

    /// Non-empty, trimmed chunks of at most `chunk_size` bytes each.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.recursive_split(text, &self.separators)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    fn recursive_split(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some((separator, remaining)) = separators.split_first() else {
            return self.split_by_length(text);
        };

        let mut chunks = Vec::new();
        let mut current = String::new();

        for piece in text.split(separator) {
            if piece.len() > self.chunk_size {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                chunks.extend(self.recursive_split(piece, remaining));
                continue;
            }

            let joined_len = if current.is_empty() {
                piece.len()
            } else {
                current.len() + separator.len() + piece.len()
            };

            if joined_len <= self.chunk_size {
                if !current.is_empty() {
                    current.push_str(separator);
                }
                current.push_str(piece);
            } else {
                chunks.push(std::mem::replace(&mut current, piece.to_string()));
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    fn split_by_length(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let mut end = (start + self.chunk_size).min(text.len());
            while end > start && !text.is_char_boundary(end) {
                end -= 1;
            }
            if end == start {
                // A single character wider than the chunk size.
                end = start + text[start..].chars().next().map_or(1, char::len_utf8);
            }
            chunks.push(text[start..end].to_string());
            start = end;
        }

        chunks
    }
}

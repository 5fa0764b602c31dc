pub mod mock_generation_server;
pub mod pdf_fixture;

pub use mock_generation_server::{MockGenerationServer, MockReply};
pub use pdf_fixture::single_page_pdf;

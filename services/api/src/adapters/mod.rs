pub mod export;
pub mod file_storage;
pub mod mock_llm;
pub mod openai_llm;
pub mod pptx;

pub use export::{exporter_for, DocxExporter, TextExporter};
pub use file_storage::FileStorage;
pub use mock_llm::MockGenerationAdapter;
pub use openai_llm::OpenAiGenerationAdapter;
pub use pptx::PptxExporter;

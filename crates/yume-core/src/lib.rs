pub mod interpreter;
pub mod llm;
pub mod openai;
pub mod status;
pub mod visualizer;

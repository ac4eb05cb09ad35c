pub mod analyzer;
pub mod doc_parser;
pub mod log_recorder;
pub mod persistence;
pub mod script_generator;
pub mod test_case_generator;
pub mod yaml_generator;

pub use analyzer::AnalyzerAgent;
pub use doc_parser::DocParserAgent;
pub use log_recorder::LogRecorderAgent;
pub use persistence::PersistenceAgent;
pub use script_generator::ScriptGeneratorAgent;
pub use test_case_generator::TestCaseGeneratorAgent;
pub use yaml_generator::YamlGeneratorAgent;

mod classic_tests;
mod config_tests;
mod engine_tests;
mod tokenizer_tests;

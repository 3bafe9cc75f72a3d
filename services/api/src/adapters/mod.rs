pub mod card_llm;
pub mod db;
pub mod plan_llm;

mod orchestrator;

pub use orchestrator::search_all_sites;

pub mod parser;

pub use parser::{parse_atms, parse_toilets, tag_address, NO_TAG_ADDRESS};

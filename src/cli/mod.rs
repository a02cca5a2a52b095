pub mod interface;

pub use interface::CliInterface;

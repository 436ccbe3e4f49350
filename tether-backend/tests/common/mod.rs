pub mod test_storage;

pub use test_storage::TestStorage;

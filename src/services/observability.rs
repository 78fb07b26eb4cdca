pub mod test_logger;

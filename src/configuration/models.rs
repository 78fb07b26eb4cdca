pub mod test_context_settings;

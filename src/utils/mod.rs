pub mod day_off_type_cache;

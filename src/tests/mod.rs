mod basic_tests;
mod stamped_lock_tests;

//! `columns` and `tags`: list what the backend knows about.

use crate::api::{ApiError, Backend};

fn print_list(result: Result<Vec<String>, ApiError>) -> Result<(), i32> {
    match result {
        Ok(names) => {
            for name in names {
                println!("{}", name);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            Err(1)
        }
    }
}

pub fn columns(backend: &dyn Backend) -> Result<(), i32> {
    print_list(backend.columns())
}

pub fn tags(backend: &dyn Backend) -> Result<(), i32> {
    print_list(backend.tags())
}

//! Person name generators backed by the `fake` crate.

use fake::faker::name::en::{FirstName, LastName, Name};
use fake::Fake;

/// A random first name.
pub fn first_name() -> String {
    FirstName().fake()
}

/// A random last name.
pub fn last_name() -> String {
    LastName().fake()
}

/// A random full name.
pub fn full_name() -> String {
    Name().fake()
}

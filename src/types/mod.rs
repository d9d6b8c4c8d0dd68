//! Public types for the Huginn API.

mod mention;

pub use mention::{Author, Content, Mention, MentionProperty};

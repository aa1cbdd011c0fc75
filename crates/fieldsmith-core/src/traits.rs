pub mod session;
pub mod text;

pub use self::{
    session::{RemoteDriver, RemoteSession, SessionError},
    text::{NoGeneration, TextGenerator},
};

pub mod movie;
pub mod session;
pub mod user;

pub use movie::{
    join_directors, ListKind, Movie, MovieCandidate, MovieDetails, MovieView, NewMovie,
};
pub use session::{generate_token, Session};
pub use user::{NewUser, User, UserSummary};

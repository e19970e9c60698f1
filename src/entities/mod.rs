pub mod playlist;
pub mod playlist_track;
pub mod track;
pub mod user;
pub mod user_playlist;

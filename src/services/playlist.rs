use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};
use tracing::instrument;

use crate::database::Database;
use crate::entities;
use crate::services::LinkOutcome;

pub struct PlaylistWithTracks {
    pub playlist: entities::playlist::Model,
    pub tracks: Vec<entities::track::Model>,
}

pub struct PlaylistService {
    db: Arc<Database>,
}

impl PlaylistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        title: String,
        thumbnail: String,
        private: bool,
    ) -> Result<entities::playlist::Model> {
        let playlist = entities::playlist::ActiveModel {
            title: Set(title),
            thumbnail: Set(thumbnail),
            private: Set(private),
            ..entities::playlist::ActiveModel::new()
        };

        let model = playlist
            .insert(&self.db.conn)
            .await
            .wrap_err("Failed to create playlist")?;

        log::info!("Playlist created: '{}' (ID: {})", model.title, model.id);
        Ok(model)
    }

    async fn find(&self, playlist_id: i64) -> Result<Option<entities::playlist::Model>> {
        entities::playlist::Entity::find_by_id(playlist_id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to find playlist")
    }

    /// The playlist and its tracks in the order they were added.
    pub async fn get_with_tracks(&self, playlist_id: i64) -> Result<Option<PlaylistWithTracks>> {
        let Some(playlist) = self.find(playlist_id).await? else {
            return Ok(None);
        };

        let track_ids: Vec<i64> = entities::playlist_track::Entity::find()
            .filter(entities::playlist_track::Column::PlaylistId.eq(playlist_id))
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlist tracks")?
            .into_iter()
            .map(|pt| pt.track_id)
            .collect();

        let tracks = if track_ids.is_empty() {
            Vec::new()
        } else {
            entities::track::Entity::find()
                .filter(entities::track::Column::Id.is_in(track_ids))
                .order_by_asc(entities::track::Column::Id)
                .all(&self.db.conn)
                .await
                .wrap_err("Failed to fetch tracks")?
        };

        Ok(Some(PlaylistWithTracks { playlist, tracks }))
    }

    /// Create a track for `url` and attach it to the playlist.
    /// Returns `None` without writing anything if the playlist does not exist.
    #[instrument(skip(self))]
    pub async fn add_track(
        &self,
        playlist_id: i64,
        url: String,
    ) -> Result<Option<entities::track::Model>> {
        if self.find(playlist_id).await?.is_none() {
            return Ok(None);
        }

        let track = self
            .db
            .conn
            .transaction::<_, entities::track::Model, color_eyre::eyre::Report>(|txn| {
                Box::pin(async move {
                    let track = entities::track::ActiveModel {
                        url: Set(url),
                        ..entities::track::ActiveModel::new()
                    }
                    .insert(txn)
                    .await
                    .wrap_err("Failed to create track")?;

                    entities::playlist_track::ActiveModel {
                        playlist_id: Set(playlist_id),
                        track_id: Set(track.id),
                        ..entities::playlist_track::ActiveModel::new()
                    }
                    .insert(txn)
                    .await
                    .wrap_err("Failed to add track to playlist")?;

                    Ok(track)
                })
            })
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to add track to playlist: {}", e))?;

        log::debug!("Track {} added to playlist {}", track.id, playlist_id);
        Ok(Some(track))
    }

    #[instrument(skip(self))]
    pub async fn remove_track(&self, playlist_id: i64, track_id: i64) -> Result<LinkOutcome> {
        if self.find(playlist_id).await?.is_none() {
            return Ok(LinkOutcome::OwnerMissing);
        }

        entities::playlist_track::Entity::delete_many()
            .filter(entities::playlist_track::Column::PlaylistId.eq(playlist_id))
            .filter(entities::playlist_track::Column::TrackId.eq(track_id))
            .exec(&self.db.conn)
            .await
            .wrap_err("Failed to remove track from playlist")?;

        Ok(LinkOutcome::Unlinked)
    }

    /// Delete a playlist. Its user and track associations go with it.
    pub async fn delete(&self, playlist_id: i64) -> Result<()> {
        let result = entities::playlist::Entity::delete_by_id(playlist_id)
            .exec(&self.db.conn)
            .await
            .wrap_err("Failed to delete playlist")?;

        log::debug!(
            "Deleted playlist {} ({} rows)",
            playlist_id,
            result.rows_affected
        );
        Ok(())
    }

    /// Public playlists whose title contains `query`, case-sensitively.
    /// `%` and `_` are plain characters here, unlike in `LIKE`.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<entities::playlist::Model>> {
        entities::playlist::Entity::find()
            .filter(Expr::cust_with_values("instr(\"title\", ?) > 0", [query]))
            .filter(entities::playlist::Column::Private.eq(false))
            .order_by_asc(entities::playlist::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to search playlists")
    }
}

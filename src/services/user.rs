use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};
use tracing::instrument;

use crate::database::Database;
use crate::entities;
use crate::services::LinkOutcome;

pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        login: String,
        password: String,
        username: String,
        avatar: Option<String>,
    ) -> Result<entities::user::Model> {
        let user = entities::user::ActiveModel {
            login: Set(login),
            password: Set(password),
            username: Set(username),
            avatar: Set(avatar),
            ..entities::user::ActiveModel::new()
        };

        let model = user
            .insert(&self.db.conn)
            .await
            .wrap_err("Failed to create user")?;

        log::info!("User created: '{}' (ID: {})", model.username, model.id);
        Ok(model)
    }

    pub async fn get(&self, id: i64) -> Result<Option<entities::user::Model>> {
        entities::user::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch user")
    }

    /// Plaintext login/password match. Returns the lowest matching user id.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Option<i64>> {
        let user = entities::user::Entity::find()
            .filter(entities::user::Column::Login.eq(login))
            .filter(entities::user::Column::Password.eq(password))
            .order_by_asc(entities::user::Column::Id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to query user by credentials")?;

        Ok(user.map(|u| u.id))
    }

    /// Playlists attached to the user, or `None` if the user does not exist.
    pub async fn playlists(&self, user_id: i64) -> Result<Option<Vec<entities::playlist::Model>>> {
        if self.get(user_id).await?.is_none() {
            return Ok(None);
        }

        let playlist_ids: Vec<i64> = entities::user_playlist::Entity::find()
            .filter(entities::user_playlist::Column::UserId.eq(user_id))
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch user playlists")?
            .into_iter()
            .map(|up| up.playlist_id)
            .collect();

        if playlist_ids.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let playlists = entities::playlist::Entity::find()
            .filter(entities::playlist::Column::Id.is_in(playlist_ids))
            .order_by_asc(entities::playlist::Column::Id)
            .all(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlists")?;

        Ok(Some(playlists))
    }

    /// Attach a playlist to a user. Attaching twice leaves a single association.
    #[instrument(skip(self))]
    pub async fn add_playlist(&self, user_id: i64, playlist_id: i64) -> Result<LinkOutcome> {
        if self.get(user_id).await?.is_none() {
            return Ok(LinkOutcome::OwnerMissing);
        }

        let playlist = entities::playlist::Entity::find_by_id(playlist_id)
            .one(&self.db.conn)
            .await
            .wrap_err("Failed to fetch playlist")?;
        if playlist.is_none() {
            return Ok(LinkOutcome::TargetMissing);
        }

        let user_playlist = entities::user_playlist::ActiveModel {
            user_id: Set(user_id),
            playlist_id: Set(playlist_id),
            ..entities::user_playlist::ActiveModel::new()
        };

        let inserted = entities::user_playlist::Entity::insert(user_playlist)
            .on_conflict(
                OnConflict::columns([
                    entities::user_playlist::Column::UserId,
                    entities::user_playlist::Column::PlaylistId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db.conn)
            .await
            .wrap_err("Failed to add playlist to user")?;

        log::debug!(
            "Linked playlist {} to user {} ({} new rows)",
            playlist_id,
            user_id,
            inserted
        );
        Ok(LinkOutcome::Linked)
    }

    /// Detach a playlist from a user. Detaching a playlist that is not attached is not an error.
    #[instrument(skip(self))]
    pub async fn remove_playlist(&self, user_id: i64, playlist_id: i64) -> Result<LinkOutcome> {
        if self.get(user_id).await?.is_none() {
            return Ok(LinkOutcome::OwnerMissing);
        }

        entities::user_playlist::Entity::delete_many()
            .filter(entities::user_playlist::Column::UserId.eq(user_id))
            .filter(entities::user_playlist::Column::PlaylistId.eq(playlist_id))
            .exec(&self.db.conn)
            .await
            .wrap_err("Failed to remove playlist from user")?;

        Ok(LinkOutcome::Unlinked)
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(User::Login).string().not_null())
                    .col(ColumnDef::new(User::Password).string().not_null())
                    .col(ColumnDef::new(User::Username).string().not_null())
                    .col(ColumnDef::new(User::Avatar).string())
                    .col(ColumnDef::new(User::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(User::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create playlists table
        manager
            .create_table(
                Table::create()
                    .table(Playlist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Playlist::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Playlist::Title).string().not_null())
                    .col(ColumnDef::new(Playlist::Thumbnail).string().not_null())
                    .col(
                        ColumnDef::new(Playlist::Private)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Playlist::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Playlist::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create tracks table
        manager
            .create_table(
                Table::create()
                    .table(Track::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Track::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Track::Url).string().not_null())
                    .col(ColumnDef::new(Track::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Track::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create user_playlists junction table
        manager
            .create_table(
                Table::create()
                    .table(UserPlaylist::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserPlaylist::UserId).integer().not_null())
                    .col(ColumnDef::new(UserPlaylist::PlaylistId).integer().not_null())
                    .col(ColumnDef::new(UserPlaylist::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(UserPlaylist::UpdatedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(UserPlaylist::UserId)
                            .col(UserPlaylist::PlaylistId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_playlists_user_id")
                            .from(UserPlaylist::Table, UserPlaylist::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_playlists_playlist_id")
                            .from(UserPlaylist::Table, UserPlaylist::PlaylistId)
                            .to(Playlist::Table, Playlist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create playlist_tracks junction table
        manager
            .create_table(
                Table::create()
                    .table(PlaylistTrack::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlaylistTrack::PlaylistId).integer().not_null())
                    .col(ColumnDef::new(PlaylistTrack::TrackId).integer().not_null())
                    .col(ColumnDef::new(PlaylistTrack::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(PlaylistTrack::UpdatedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(PlaylistTrack::PlaylistId)
                            .col(PlaylistTrack::TrackId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_tracks_playlist_id")
                            .from(PlaylistTrack::Table, PlaylistTrack::PlaylistId)
                            .to(Playlist::Table, Playlist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_playlist_tracks_track_id")
                            .from(PlaylistTrack::Table, PlaylistTrack::TrackId)
                            .to(Track::Table, Track::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Search filters on title and visibility
        manager
            .create_index(
                Index::create()
                    .name("idx_playlists_private_title")
                    .table(Playlist::Table)
                    .col(Playlist::Private)
                    .col(Playlist::Title)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(PlaylistTrack::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserPlaylist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Track::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Playlist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Login,
    Password,
    Username,
    Avatar,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Playlist {
    #[sea_orm(iden = "playlists")]
    Table,
    Id,
    Title,
    Thumbnail,
    Private,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Track {
    #[sea_orm(iden = "tracks")]
    Table,
    Id,
    Url,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserPlaylist {
    #[sea_orm(iden = "user_playlists")]
    Table,
    UserId,
    PlaylistId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PlaylistTrack {
    #[sea_orm(iden = "playlist_tracks")]
    Table,
    PlaylistId,
    TrackId,
    CreatedAt,
    UpdatedAt,
}

//! Handler tests
//!
//! Run against the in-memory storage backend.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::domain::{AssetKind, ContentKind};
    use crate::error::AppError;
    use crate::handlers::{
        CollectFavorCommand, CollectFavorHandler, ListUsersHandler, ListUsersQuery,
        UpdateAssetCommand, UpdateAssetHandler,
    };
    use crate::preferences::PreferenceStore;
    use crate::projection::CounterReconciler;
    use crate::storage::{InMemoryStorage, Storage};

    // =========================================================================
    // Command validation
    // =========================================================================

    #[test]
    fn test_collect_favor_command_tags() {
        let cmd = CollectFavorCommand::new(1, " action  drama ", 42);
        assert_eq!(cmd.tags(), ["action", "drama"]);
        assert_eq!(cmd.movie_id, 42);
    }

    #[test]
    fn test_list_users_query_defaults_and_offset() {
        let query = ListUsersQuery::default();
        assert_eq!((query.page, query.limit), (1, 10));
        assert_eq!(query.offset(), 0);
        assert_eq!(ListUsersQuery::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_list_users_query_validation() {
        assert!(ListUsersQuery::new(1, 1).validate().is_ok());
        assert!(ListUsersQuery::new(1, 100).validate().is_ok());

        for query in [
            ListUsersQuery::new(0, 10),
            ListUsersQuery::new(1, 0),
            ListUsersQuery::new(1, 101),
        ] {
            assert!(
                matches!(query.validate(), Err(AppError::InvalidRequest(_))),
                "expected rejection for {:?}",
                query
            );
        }
    }

    #[test]
    fn test_update_asset_command_validation() {
        assert!(UpdateAssetCommand::new(1, AssetKind::Avatar, "me_1700000000.jpg")
            .validate()
            .is_ok());

        for name in ["", "..", "../etc/passwd", "a/b.png", "a\\b.png"] {
            assert!(
                UpdateAssetCommand::new(1, AssetKind::Cover, name)
                    .validate()
                    .is_err(),
                "expected rejection for {:?}",
                name
            );
        }
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    #[tokio::test]
    async fn test_collect_favor_records_tags_and_movie() {
        let storage = Arc::new(InMemoryStorage::new());
        let id = storage.insert_user("mia").unwrap();
        let handler = CollectFavorHandler::new(Arc::new(PreferenceStore::new(storage.clone())));

        let first = handler
            .execute(CollectFavorCommand::new(id, "action drama", 603))
            .await
            .unwrap();
        assert_eq!(first.added_tags, ["action", "drama"]);
        assert!(first.movie_added);

        let second = handler
            .execute(CollectFavorCommand::new(id, "drama comedy", 603))
            .await
            .unwrap();
        assert_eq!(second.added_tags, ["comedy"]);
        assert!(!second.movie_added);

        let (favor, movies) = storage.raw_preferences(id).unwrap();
        assert_eq!(favor.as_deref(), Some("action drama comedy"));
        assert_eq!(movies.as_deref(), Some("603"));
    }

    #[tokio::test]
    async fn test_collect_favor_unknown_user() {
        let storage = Arc::new(InMemoryStorage::new());
        let handler = CollectFavorHandler::new(Arc::new(PreferenceStore::new(storage)));

        let err = handler
            .execute(CollectFavorCommand::new(9, "drama", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound(9)));
    }

    #[tokio::test]
    async fn test_list_users_pages_and_refreshes_counters() {
        let storage = Arc::new(InMemoryStorage::new());
        let ids: Vec<i64> = ["n1", "n2", "n3"]
            .iter()
            .map(|name| storage.insert_user(name).unwrap())
            .collect();
        storage
            .insert_content(ContentKind::Review, ids[0], "r", 0, 0)
            .unwrap();
        storage
            .insert_content(ContentKind::Words, ids[2], "w", 0, 0)
            .unwrap();

        let handler = ListUsersHandler::new(
            storage.clone(),
            CounterReconciler::new(storage.clone()),
        );

        let page = handler.execute(ListUsersQuery::new(1, 2)).await.unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(
            page.users.iter().map(|u| u.id).collect::<Vec<_>>(),
            ids[..2].to_vec()
        );

        let page = handler.execute(ListUsersQuery::new(2, 2)).await.unwrap();
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].id, ids[2]);

        // the refresh is detached; poll until it lands
        let mut refreshed = false;
        for _ in 0..50 {
            let first = storage.get_user(ids[0]).await.unwrap().unwrap();
            let third = storage.get_user(ids[2]).await.unwrap().unwrap();
            if first.review_count == 1 && third.words_count == 1 {
                refreshed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(refreshed, "listing should trigger counter reconcile");
    }

    #[tokio::test]
    async fn test_update_asset_sets_url_by_kind() {
        let storage = Arc::new(InMemoryStorage::new());
        let id = storage.insert_user("noah").unwrap();
        let handler = UpdateAssetHandler::new(storage.clone(), "https://film.example/");

        let result = handler
            .execute(UpdateAssetCommand::new(id, AssetKind::Cover, "poster_1.png"))
            .await
            .unwrap();
        assert_eq!(result.url, "https://film.example/images/poster_1.png");

        let user = storage.get_user(id).await.unwrap().unwrap();
        assert_eq!(user.cover.as_deref(), Some("https://film.example/images/poster_1.png"));
        assert!(user.avatar.is_none());
    }

    #[tokio::test]
    async fn test_update_asset_unknown_user() {
        let storage = Arc::new(InMemoryStorage::new());
        let handler = UpdateAssetHandler::new(storage, "http://localhost");

        let err = handler
            .execute(UpdateAssetCommand::new(5, AssetKind::Avatar, "a.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound(5)));
    }
}

use crate::{
    models::{NewPermission, NewRole, NewUser, DELETE_USERS, VIEW_USERS},
    repository::{AccessRepository, StoreResult, UserRepository},
};

/// Populates an empty store with a small demo data set: two users, an
/// `admin` role holding every permission and a `viewer` role.
pub async fn seed_demo(
    users: &dyn UserRepository,
    access: &dyn AccessRepository,
) -> StoreResult<()> {
    if !users.list_users().await?.is_empty() {
        log::info!("Store already has users; skipping demo seed");
        return Ok(());
    }

    let view = access.create_permission(NewPermission::new(VIEW_USERS)).await?;
    let delete = access.create_permission(NewPermission::new(DELETE_USERS)).await?;

    let admin = access.create_role(NewRole::new("admin")).await?;
    let viewer = access.create_role(NewRole::new("viewer")).await?;
    access.grant_permission(admin.id, view.id).await?;
    access.grant_permission(admin.id, delete.id).await?;
    access.grant_permission(viewer.id, view.id).await?;

    let alice = users.create_user(NewUser::new("Alice", "a@x.com")).await?;
    let bob = users.create_user(NewUser::new("Bob", "b@x.com")).await?;
    access.assign_role(alice.id, admin.id).await?;
    access.assign_role(bob.id, viewer.id).await?;

    log::info!("Seeded demo users, roles and permissions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::has_permission;
    use crate::repository::MemoryRepository;

    #[tokio::test]
    async fn seed_grants_delete_to_admin_only() {
        let repo = MemoryRepository::new();
        seed_demo(&repo, &repo).await.unwrap();

        let users = repo.list_users().await.unwrap();
        assert_eq!(users.len(), 2);

        let alice = repo.permissions_of_user(users[0].id).await.unwrap();
        let bob = repo.permissions_of_user(users[1].id).await.unwrap();
        assert!(has_permission(&alice, DELETE_USERS));
        assert!(!has_permission(&bob, DELETE_USERS));
        assert!(has_permission(&bob, VIEW_USERS));
    }

    #[tokio::test]
    async fn seed_is_skipped_for_populated_store() {
        let repo = MemoryRepository::new();
        seed_demo(&repo, &repo).await.unwrap();
        seed_demo(&repo, &repo).await.unwrap();

        assert_eq!(repo.list_users().await.unwrap().len(), 2);
        assert_eq!(repo.list_roles().await.unwrap().len(), 2);
    }
}

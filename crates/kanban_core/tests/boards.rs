mod common;

use common::add_column;
use kanban_core::{
    open_db_in_memory, BoardService, EntityKind, ServiceError, SqliteBoardRepository,
    SqliteUserRepository, UserService,
};
use uuid::Uuid;

#[test]
fn users_are_validated_and_unique_by_email() {
    let conn = open_db_in_memory().unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let ada = users.create_user(" Ada@Example.com ", " Ada ").unwrap();
    assert_eq!(ada.email, "ada@example.com");
    assert_eq!(ada.display_name, "Ada");
    assert_eq!(users.get_user(ada.user_uuid).unwrap(), ada);

    assert!(matches!(
        users.create_user("ada@example.com", "Other Ada"),
        Err(ServiceError::Duplicate { kind: EntityKind::User, .. })
    ));
    assert!(matches!(
        users.create_user("not-an-email", "Bob"),
        Err(ServiceError::Validation { field: "email", .. })
    ));
    assert!(matches!(
        users.get_user(Uuid::new_v4()),
        Err(ServiceError::NotFound { kind: EntityKind::User, .. })
    ));
}

#[test]
fn boards_belong_to_existing_owners() {
    let conn = open_db_in_memory().unwrap();
    let owner = UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .create_user("owner@example.com", "Owner")
        .unwrap()
        .user_uuid;
    let boards = BoardService::new(SqliteBoardRepository::try_new(&conn).unwrap());

    let roadmap = boards.create_board(owner, " Roadmap ", "2026 plans").unwrap();
    let ops = boards.create_board(owner, "Ops", "").unwrap();

    assert_eq!(roadmap.title, "Roadmap");
    let listed: Vec<Uuid> = boards
        .list_boards(owner)
        .unwrap()
        .into_iter()
        .map(|board| board.board_uuid)
        .collect();
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&roadmap.board_uuid) && listed.contains(&ops.board_uuid));

    assert!(matches!(
        boards.create_board(Uuid::new_v4(), "Nope", ""),
        Err(ServiceError::NotFound { kind: EntityKind::User, .. })
    ));
    assert!(matches!(
        boards.create_board(owner, "  ", ""),
        Err(ServiceError::Validation { field: "title", .. })
    ));
}

#[test]
fn update_and_delete_board() {
    let conn = open_db_in_memory().unwrap();
    let owner = common::add_user(&conn, "owner@example.com");
    let boards = BoardService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let board = boards.create_board(owner, "Draft", "").unwrap().board_uuid;
    add_column(&conn, board, "Todo");

    let updated = boards.update_board(board, "Final", "  ready ").unwrap();
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.description, "ready");

    boards.delete_board(board).unwrap();
    assert!(matches!(
        boards.get_board(board),
        Err(ServiceError::NotFound { kind: EntityKind::Board, .. })
    ));
    assert!(matches!(
        boards.delete_board(board),
        Err(ServiceError::NotFound { kind: EntityKind::Board, .. })
    ));
}

#![allow(dead_code)]

use kanban_core::position::{CardAttrs, ColumnAttrs};
use kanban_core::{
    open_db_in_memory, BoardId, BoardRepository, CardId, CardPositions, ColumnId,
    ColumnPositions, SqliteBoardRepository, SqliteUserRepository, UserId, UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

/// Migrated in-memory database with one user and one board.
pub struct Fixture {
    pub conn: Connection,
    pub owner: UserId,
    pub board: BoardId,
}

pub fn fixture() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let owner = add_user(&conn, "owner@example.com");
    let board = add_board(&conn, owner, "Roadmap");
    Fixture { conn, owner, board }
}

pub fn add_user(conn: &Connection, email: &str) -> UserId {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .create_user(email, "Someone")
        .unwrap()
        .user_uuid
}

pub fn add_board(conn: &Connection, owner: UserId, title: &str) -> BoardId {
    SqliteBoardRepository::try_new(conn)
        .unwrap()
        .create_board(owner, title, "")
        .unwrap()
        .board_uuid
}

pub fn add_column(conn: &Connection, board: BoardId, title: &str) -> ColumnId {
    ColumnPositions::append(
        conn,
        board,
        &ColumnAttrs {
            title: title.to_string(),
        },
    )
    .unwrap()
    .id
}

pub fn add_card(conn: &Connection, column: ColumnId, title: &str) -> CardId {
    CardPositions::append(
        conn,
        column,
        &CardAttrs {
            title: title.to_string(),
            ..CardAttrs::default()
        },
    )
    .unwrap()
    .id
}

pub fn add_cards(conn: &Connection, column: ColumnId, count: usize) -> Vec<CardId> {
    (0..count)
        .map(|index| add_card(conn, column, &format!("card {index}")))
        .collect()
}

/// Card ids of a column in position order.
pub fn card_order(conn: &Connection, column: ColumnId) -> Vec<Uuid> {
    CardPositions::slots(conn, column)
        .unwrap()
        .into_iter()
        .map(|slot| slot.id)
        .collect()
}

pub fn column_order(conn: &Connection, board: BoardId) -> Vec<Uuid> {
    ColumnPositions::slots(conn, board)
        .unwrap()
        .into_iter()
        .map(|slot| slot.id)
        .collect()
}

pub fn assert_cards_dense(conn: &Connection, column: ColumnId) {
    let positions: Vec<i64> = CardPositions::slots(conn, column)
        .unwrap()
        .into_iter()
        .map(|slot| slot.position)
        .collect();
    let expected: Vec<i64> = (0..positions.len() as i64).collect();
    assert_eq!(positions, expected, "column {column} is not dense");
}

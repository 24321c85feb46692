//! CLI entry point.
//!
//! `kanban_cli` prints version and schema information for the configured
//! database. `kanban_cli <board-uuid>` additionally prints the board's
//! columns and cards in position order and checks that every ordering is
//! dense.

use kanban_core::db::migrations::latest_version;
use kanban_core::{
    core_version, init_logging, open_db_with_options, CardPositions, CardService,
    ColumnPositions, ColumnService, KanbanConfig, SqliteCardRepository, SqliteColumnRepository,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;
use uuid::Uuid;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("kanban_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = KanbanConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir)?;
    }

    let conn = open_db_with_options(&config.db_path, config.db_options())?;
    info!(
        "event=cli_start module=cli status=ok db_path={}",
        config.db_path.display()
    );
    println!("kanban_core version={}", core_version());
    println!("schema version={}", latest_version());
    println!("db path={}", config.db_path.display());

    let Some(arg) = std::env::args().nth(1) else {
        return Ok(());
    };
    let board = Uuid::parse_str(arg.trim())?;

    let columns = ColumnService::new(SqliteColumnRepository::try_new(&conn)?).list_columns(board)?;
    let cards = CardService::new(SqliteCardRepository::try_new(&conn)?);

    println!(
        "board {board} columns_dense={}",
        ColumnPositions::is_dense(&conn, board)?
    );
    for column in columns {
        println!(
            "[{}] {} ({}) cards_dense={}",
            column.position,
            column.title,
            column.column_uuid,
            CardPositions::is_dense(&conn, column.column_uuid)?
        );
        for card in cards.list_cards(column.column_uuid)? {
            println!("    [{}] {} ({})", card.position, card.title, card.card_uuid);
        }
    }
    Ok(())
}

mod common;

use common::{
    add_board, add_card, add_cards, add_column, assert_cards_dense, card_order, column_order,
    fixture,
};
use kanban_core::position::{CardAttrs, ColumnAttrs};
use kanban_core::{CardPositions, ColumnPositions, EntityKind, PositionError};
use rusqlite::TransactionBehavior;
use uuid::Uuid;

#[test]
fn append_assigns_consecutive_positions() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");

    let placements: Vec<_> = (0..3)
        .map(|index| {
            CardPositions::append(
                &fx.conn,
                column,
                &CardAttrs {
                    title: format!("card {index}"),
                    ..CardAttrs::default()
                },
            )
            .unwrap()
        })
        .collect();

    let positions: Vec<i64> = placements.iter().map(|placement| placement.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
    assert!(placements.iter().all(|placement| placement.parent_id == column));
    assert_eq!(
        card_order(&fx.conn, column),
        placements.iter().map(|placement| placement.id).collect::<Vec<_>>()
    );
}

#[test]
fn append_rejects_missing_or_deleted_parent() {
    let fx = fixture();
    let missing = Uuid::new_v4();
    let err = CardPositions::append(&fx.conn, missing, &CardAttrs::default()).unwrap_err();
    assert!(matches!(
        err,
        PositionError::ParentNotFound { kind: EntityKind::Column, id } if id == missing
    ));

    let column = add_column(&fx.conn, fx.board, "Gone");
    ColumnPositions::delete_and_compact(&fx.conn, column).unwrap();
    let err = CardPositions::append(&fx.conn, column, &CardAttrs::default()).unwrap_err();
    assert!(matches!(err, PositionError::ParentNotFound { .. }));
}

#[test]
fn append_after_delete_reuses_the_freed_tail_slot() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");
    let cards = add_cards(&fx.conn, column, 3);

    CardPositions::delete_and_compact(&fx.conn, cards[0]).unwrap();
    let placement = CardPositions::append(&fx.conn, column, &CardAttrs::default()).unwrap();

    assert_eq!(placement.position, 2);
    assert_cards_dense(&fx.conn, column);
}

#[test]
fn delete_compacts_later_siblings() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");
    let cards = add_cards(&fx.conn, column, 4);

    let compaction = CardPositions::delete_and_compact(&fx.conn, cards[1]).unwrap();

    assert_eq!(compaction.parent_id, column);
    assert_eq!(compaction.removed_position, 1);
    assert_eq!(compaction.shifted, 2);
    assert_eq!(card_order(&fx.conn, column), vec![cards[0], cards[2], cards[3]]);
    assert_cards_dense(&fx.conn, column);
}

#[test]
fn delete_of_last_card_shifts_nothing_and_repeat_delete_is_not_found() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");
    let cards = add_cards(&fx.conn, column, 2);

    let compaction = CardPositions::delete_and_compact(&fx.conn, cards[1]).unwrap();
    assert_eq!(compaction.shifted, 0);

    let err = CardPositions::delete_and_compact(&fx.conn, cards[1]).unwrap_err();
    assert!(matches!(
        err,
        PositionError::NotFound { kind: EntityKind::Card, id } if id == cards[1]
    ));
    assert_eq!(card_order(&fx.conn, column), vec![cards[0]]);
}

#[test]
fn reorder_applies_permutation_and_is_idempotent() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");
    let cards = add_cards(&fx.conn, column, 4);
    let reversed: Vec<Uuid> = cards.iter().rev().copied().collect();

    assert_eq!(CardPositions::reorder(&fx.conn, column, &reversed).unwrap(), 4);
    assert_eq!(card_order(&fx.conn, column), reversed);
    assert_cards_dense(&fx.conn, column);

    assert_eq!(CardPositions::reorder(&fx.conn, column, &reversed).unwrap(), 0);
    assert_eq!(card_order(&fx.conn, column), reversed);
}

#[test]
fn reorder_counts_only_rows_that_moved() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");
    let cards = add_cards(&fx.conn, column, 4);

    let swapped = vec![cards[0], cards[2], cards[1], cards[3]];
    assert_eq!(CardPositions::reorder(&fx.conn, column, &swapped).unwrap(), 2);
    assert_eq!(card_order(&fx.conn, column), swapped);
}

#[test]
fn reorder_rejects_mismatched_sets_without_writing() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");
    let other_column = add_column(&fx.conn, fx.board, "Doing");
    let cards = add_cards(&fx.conn, column, 3);
    let foreign = add_card(&fx.conn, other_column, "elsewhere");

    let err =
        CardPositions::reorder(&fx.conn, column, &[cards[2], cards[1]]).unwrap_err();
    assert!(matches!(
        &err,
        PositionError::InvalidSet { missing, .. } if missing == &vec![cards[0]]
    ));

    let err = CardPositions::reorder(&fx.conn, column, &[cards[2], cards[1], cards[0], foreign])
        .unwrap_err();
    assert!(matches!(
        &err,
        PositionError::InvalidSet { unexpected, .. } if unexpected == &vec![foreign]
    ));

    let err = CardPositions::reorder(&fx.conn, column, &[cards[2], cards[2], cards[1], cards[0]])
        .unwrap_err();
    assert!(matches!(
        &err,
        PositionError::InvalidSet { duplicates, .. } if duplicates == &vec![cards[2]]
    ));

    assert_eq!(card_order(&fx.conn, column), cards);
}

#[test]
fn reorder_of_empty_parent_accepts_empty_list() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Empty");
    assert_eq!(CardPositions::reorder(&fx.conn, column, &[]).unwrap(), 0);

    let err = CardPositions::reorder(&fx.conn, Uuid::new_v4(), &[]).unwrap_err();
    assert!(matches!(err, PositionError::ParentNotFound { .. }));
}

#[test]
fn move_within_parent_shifts_the_range_between_slots() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");
    let c = add_cards(&fx.conn, column, 5);

    let relocation = CardPositions::move_to(&fx.conn, c[1], column, 3).unwrap();
    assert!(relocation.moved);
    assert_eq!((relocation.from_position, relocation.to_position), (1, 3));
    assert_eq!(card_order(&fx.conn, column), vec![c[0], c[2], c[3], c[1], c[4]]);

    CardPositions::move_to(&fx.conn, c[4], column, 0).unwrap();
    assert_eq!(card_order(&fx.conn, column), vec![c[4], c[0], c[2], c[3], c[1]]);
    assert_cards_dense(&fx.conn, column);
}

#[test]
fn move_to_current_slot_is_a_no_op() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");
    let cards = add_cards(&fx.conn, column, 3);

    let relocation = CardPositions::move_to(&fx.conn, cards[1], column, 1).unwrap();

    assert!(!relocation.moved);
    assert_eq!(card_order(&fx.conn, column), cards);
}

#[test]
fn move_across_columns_closes_source_gap_and_opens_target_slot() {
    let fx = fixture();
    let a = add_column(&fx.conn, fx.board, "A");
    let b = add_column(&fx.conn, fx.board, "B");
    let a_cards = add_cards(&fx.conn, a, 3);
    let b_cards = add_cards(&fx.conn, b, 2);

    let relocation = CardPositions::move_to(&fx.conn, a_cards[1], b, 1).unwrap();

    assert_eq!(relocation.from_parent, a);
    assert_eq!(relocation.to_parent, b);
    assert_eq!(card_order(&fx.conn, a), vec![a_cards[0], a_cards[2]]);
    assert_eq!(card_order(&fx.conn, b), vec![b_cards[0], a_cards[1], b_cards[1]]);
    assert_cards_dense(&fx.conn, a);
    assert_cards_dense(&fx.conn, b);
}

#[test]
fn move_across_columns_accepts_one_past_the_end() {
    let fx = fixture();
    let a = add_column(&fx.conn, fx.board, "A");
    let b = add_column(&fx.conn, fx.board, "B");
    let a_cards = add_cards(&fx.conn, a, 2);
    let b_cards = add_cards(&fx.conn, b, 1);

    CardPositions::move_to(&fx.conn, a_cards[0], b, 1).unwrap();
    assert_eq!(card_order(&fx.conn, b), vec![b_cards[0], a_cards[0]]);

    let err = CardPositions::move_to(&fx.conn, a_cards[1], b, 3).unwrap_err();
    assert!(matches!(
        err,
        PositionError::InvalidPosition { position: 3, max: 2 }
    ));
}

#[test]
fn move_into_empty_column_lands_at_zero() {
    let fx = fixture();
    let a = add_column(&fx.conn, fx.board, "A");
    let empty = add_column(&fx.conn, fx.board, "Empty");
    let cards = add_cards(&fx.conn, a, 1);

    CardPositions::move_to(&fx.conn, cards[0], empty, 0).unwrap();

    assert!(card_order(&fx.conn, a).is_empty());
    assert_eq!(card_order(&fx.conn, empty), vec![cards[0]]);
}

#[test]
fn move_rejects_out_of_range_positions_without_writing() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");
    let cards = add_cards(&fx.conn, column, 4);

    let err = CardPositions::move_to(&fx.conn, cards[0], column, 4).unwrap_err();
    assert!(matches!(
        err,
        PositionError::InvalidPosition { position: 4, max: 3 }
    ));
    let err = CardPositions::move_to(&fx.conn, cards[0], column, -1).unwrap_err();
    assert!(matches!(
        err,
        PositionError::InvalidPosition { position: -1, .. }
    ));
    assert_eq!(card_order(&fx.conn, column), cards);
}

#[test]
fn move_rejects_missing_child_or_parent() {
    let fx = fixture();
    let column = add_column(&fx.conn, fx.board, "Todo");
    let cards = add_cards(&fx.conn, column, 2);

    let err = CardPositions::move_to(&fx.conn, Uuid::new_v4(), column, 0).unwrap_err();
    assert!(matches!(err, PositionError::NotFound { kind: EntityKind::Card, .. }));

    let err = CardPositions::move_to(&fx.conn, cards[0], Uuid::new_v4(), 0).unwrap_err();
    assert!(matches!(
        err,
        PositionError::ParentNotFound { kind: EntityKind::Column, .. }
    ));
    assert_eq!(card_order(&fx.conn, column), cards);
}

#[test]
fn move_and_move_back_restores_original_order() {
    let fx = fixture();
    let a = add_column(&fx.conn, fx.board, "A");
    let b = add_column(&fx.conn, fx.board, "B");
    let a_cards = add_cards(&fx.conn, a, 3);
    let b_cards = add_cards(&fx.conn, b, 3);

    let relocation = CardPositions::move_to(&fx.conn, a_cards[0], b, 2).unwrap();
    CardPositions::move_to(
        &fx.conn,
        a_cards[0],
        relocation.from_parent,
        relocation.from_position,
    )
    .unwrap();

    assert_eq!(card_order(&fx.conn, a), a_cards);
    assert_eq!(card_order(&fx.conn, b), b_cards);
}

#[test]
fn columns_follow_the_same_rules_within_and_across_boards() {
    let fx = fixture();
    let other_board = add_board(&fx.conn, fx.owner, "Ops");
    let columns: Vec<Uuid> = ["Todo", "Doing", "Done"]
        .iter()
        .map(|title| add_column(&fx.conn, fx.board, title))
        .collect();

    ColumnPositions::move_to(&fx.conn, columns[2], fx.board, 0).unwrap();
    assert_eq!(
        column_order(&fx.conn, fx.board),
        vec![columns[2], columns[0], columns[1]]
    );

    ColumnPositions::move_to(&fx.conn, columns[0], other_board, 0).unwrap();
    assert_eq!(column_order(&fx.conn, fx.board), vec![columns[2], columns[1]]);
    assert_eq!(column_order(&fx.conn, other_board), vec![columns[0]]);
    assert!(ColumnPositions::is_dense(&fx.conn, fx.board).unwrap());

    let compaction = ColumnPositions::delete_and_compact(&fx.conn, columns[2]).unwrap();
    assert_eq!(compaction.shifted, 1);
    assert_eq!(column_order(&fx.conn, fx.board), vec![columns[1]]);
}

#[test]
fn dropped_caller_transaction_rolls_back_every_step() {
    let mut fx = fixture();
    let a = add_column(&fx.conn, fx.board, "A");
    let b = add_column(&fx.conn, fx.board, "B");
    let a_cards = add_cards(&fx.conn, a, 3);

    {
        let tx = fx
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();
        CardPositions::append_in(&tx, a, &CardAttrs::default()).unwrap();
        CardPositions::move_to_in(&tx, a_cards[0], b, 0).unwrap();
        CardPositions::delete_and_compact_in(&tx, a_cards[1]).unwrap();
    }

    assert_eq!(card_order(&fx.conn, a), a_cards);
    assert!(card_order(&fx.conn, b).is_empty());
}

#[test]
fn committed_caller_transaction_applies_all_steps_together() {
    let mut fx = fixture();
    let a = add_column(&fx.conn, fx.board, "A");
    let a_cards = add_cards(&fx.conn, a, 2);

    let tx = fx
        .conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .unwrap();
    let placement = ColumnPositions::append_in(
        &tx,
        fx.board,
        &ColumnAttrs {
            title: "B".to_string(),
        },
    )
    .unwrap();
    CardPositions::move_to_in(&tx, a_cards[1], placement.id, 0).unwrap();
    tx.commit().unwrap();

    assert_eq!(card_order(&fx.conn, a), vec![a_cards[0]]);
    assert_eq!(card_order(&fx.conn, placement.id), vec![a_cards[1]]);
}

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

#[test]
fn scripted_operation_mix_keeps_every_column_dense_and_matching_model() {
    let fx = fixture();
    let columns = [
        add_column(&fx.conn, fx.board, "A"),
        add_column(&fx.conn, fx.board, "B"),
        add_column(&fx.conn, fx.board, "C"),
    ];
    let mut model: Vec<Vec<Uuid>> = vec![Vec::new(); columns.len()];
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);

    for _ in 0..300 {
        let src = rng.below(columns.len());
        match rng.below(4) {
            0 => {
                let id = add_card(&fx.conn, columns[src], "scripted");
                model[src].push(id);
            }
            1 if !model[src].is_empty() => {
                let index = rng.below(model[src].len());
                let id = model[src].remove(index);
                CardPositions::delete_and_compact(&fx.conn, id).unwrap();
            }
            2 if model[src].len() > 1 => {
                model[src].rotate_left(1);
                CardPositions::reorder(&fx.conn, columns[src], &model[src]).unwrap();
            }
            3 if !model[src].is_empty() => {
                let dst = rng.below(columns.len());
                let index = rng.below(model[src].len());
                let id = model[src].remove(index);
                let position = rng.below(model[dst].len() + 1);
                model[dst].insert(position, id);
                CardPositions::move_to(&fx.conn, id, columns[dst], position as i64).unwrap();
            }
            _ => {}
        }

        for (column, expected) in columns.iter().zip(&model) {
            assert_cards_dense(&fx.conn, *column);
            assert_eq!(&card_order(&fx.conn, *column), expected);
        }
    }
}

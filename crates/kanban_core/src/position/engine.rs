//! Transactional ordering operations shared by every ordered family.
//!
//! # Invariants
//! - Every write runs inside one `BEGIN IMMEDIATE` transaction. The write
//!   lock is held before the first read, so no two writers ever derive
//!   positions from the same snapshot.
//! - After commit, each touched parent's living children hold positions
//!   exactly `0..n`.
//! - Out-of-range positions and mismatched reorder sets are rejected, never
//!   clamped or filtered.

use crate::db::NOW_MS_SQL;
use crate::position::error::{PositionError, PositionResult};
use crate::position::family::OrderedFamily;
use log::{error, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::time::Instant;
use uuid::Uuid;

/// Where an appended child landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub position: i64,
}

/// Outcome of a delete-and-compact pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compaction {
    pub parent_id: Uuid,
    pub removed_position: i64,
    /// Number of later siblings shifted down by one.
    pub shifted: usize,
}

/// Outcome of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub from_parent: Uuid,
    pub from_position: i64,
    pub to_parent: Uuid,
    pub to_position: i64,
    /// `false` when the child already sat at the target slot.
    pub moved: bool,
}

/// One living child and its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: Uuid,
    pub position: i64,
}

/// Position engine for one ordered family.
///
/// Stateless; every operation is an associated function. The plain form
/// takes a `Connection` and runs in its own immediate transaction. The
/// `_in` form takes a caller-owned `Transaction` so several operations can
/// commit or roll back together.
pub struct PositionEngine<F: OrderedFamily>(PhantomData<F>);

impl<F: OrderedFamily> PositionEngine<F> {
    /// Appends a new child at the end of `parent_id`.
    pub fn append(
        conn: &Connection,
        parent_id: Uuid,
        attrs: &F::Attrs,
    ) -> PositionResult<Placement> {
        run::<F, _, PositionError>("append", parent_id, conn, |tx| {
            Self::append_in(tx, parent_id, attrs)
        })
    }

    pub fn append_in(
        tx: &Transaction<'_>,
        parent_id: Uuid,
        attrs: &F::Attrs,
    ) -> PositionResult<Placement> {
        ensure_parent_alive::<F>(tx, parent_id)?;
        let position = living_count::<F>(tx, parent_id)?;
        let id = Uuid::new_v4();
        F::insert(tx, id, parent_id, position, attrs)?;
        Ok(Placement {
            id,
            parent_id,
            position,
        })
    }

    /// Soft-deletes one child and closes the gap it leaves behind.
    pub fn delete_and_compact(conn: &Connection, child_id: Uuid) -> PositionResult<Compaction> {
        run::<F, _, PositionError>("delete", child_id, conn, |tx| {
            Self::delete_and_compact_in(tx, child_id)
        })
    }

    pub fn delete_and_compact_in(
        tx: &Transaction<'_>,
        child_id: Uuid,
    ) -> PositionResult<Compaction> {
        let (parent_id, position) = load_child::<F>(tx, child_id)?;

        tx.execute(
            &format!(
                "UPDATE {table}
                 SET is_deleted = 1,
                     updated_at = {NOW_MS_SQL}
                 WHERE {id} = ?1
                   AND is_deleted = 0;",
                table = F::TABLE,
                id = F::ID_COLUMN,
            ),
            [child_id.to_string()],
        )?;

        let shifted = tx.execute(
            &format!(
                "UPDATE {table}
                 SET position = position - 1,
                     updated_at = {NOW_MS_SQL}
                 WHERE {parent} = ?1
                   AND is_deleted = 0
                   AND position > ?2;",
                table = F::TABLE,
                parent = F::PARENT_COLUMN,
            ),
            params![parent_id.to_string(), position],
        )?;

        Ok(Compaction {
            parent_id,
            removed_position: position,
            shifted,
        })
    }

    /// Rewrites positions of `parent_id`'s children to follow `ordered`.
    ///
    /// `ordered` must name every living child exactly once. Returns the
    /// number of rows whose position actually changed.
    pub fn reorder(conn: &Connection, parent_id: Uuid, ordered: &[Uuid]) -> PositionResult<usize> {
        run::<F, _, PositionError>("reorder", parent_id, conn, |tx| {
            Self::reorder_in(tx, parent_id, ordered)
        })
    }

    pub fn reorder_in(
        tx: &Transaction<'_>,
        parent_id: Uuid,
        ordered: &[Uuid],
    ) -> PositionResult<usize> {
        ensure_parent_alive::<F>(tx, parent_id)?;
        let current = list_slots::<F>(tx, parent_id)?;
        validate_reorder_set(parent_id, &current, ordered)?;

        let mut stmt = tx.prepare_cached(&format!(
            "UPDATE {table}
             SET position = ?2,
                 updated_at = {NOW_MS_SQL}
             WHERE {id} = ?1
               AND {parent} = ?3
               AND is_deleted = 0;",
            table = F::TABLE,
            id = F::ID_COLUMN,
            parent = F::PARENT_COLUMN,
        ))?;

        let stored: HashMap<Uuid, i64> = current
            .iter()
            .map(|slot| (slot.id, slot.position))
            .collect();
        let mut changed = 0;
        for (index, id) in ordered.iter().enumerate() {
            let target = index as i64;
            if stored.get(id) == Some(&target) {
                continue;
            }
            stmt.execute(params![id.to_string(), target, parent_id.to_string()])?;
            changed += 1;
        }
        Ok(changed)
    }

    /// Moves one child to `new_position` under `new_parent`, which may be
    /// its current parent.
    ///
    /// Valid targets are `0..=n` for a foreign parent with `n` children and
    /// `0..n` for the current parent (the child itself is not counted).
    pub fn move_to(
        conn: &Connection,
        child_id: Uuid,
        new_parent: Uuid,
        new_position: i64,
    ) -> PositionResult<Relocation> {
        run::<F, _, PositionError>("move", child_id, conn, |tx| {
            Self::move_to_in(tx, child_id, new_parent, new_position)
        })
    }

    pub fn move_to_in(
        tx: &Transaction<'_>,
        child_id: Uuid,
        new_parent: Uuid,
        new_position: i64,
    ) -> PositionResult<Relocation> {
        let (old_parent, old_position) = load_child::<F>(tx, child_id)?;
        ensure_parent_alive::<F>(tx, new_parent)?;

        let same_parent = old_parent == new_parent;
        let sibling_count = living_count::<F>(tx, new_parent)?;
        let max = if same_parent {
            sibling_count - 1
        } else {
            sibling_count
        };
        if new_position < 0 || new_position > max {
            return Err(PositionError::InvalidPosition {
                position: new_position,
                max,
            });
        }

        let mut relocation = Relocation {
            from_parent: old_parent,
            from_position: old_position,
            to_parent: new_parent,
            to_position: new_position,
            moved: false,
        };

        if same_parent {
            if new_position == old_position {
                return Ok(relocation);
            }
            if new_position < old_position {
                shift_range::<F>(tx, old_parent, 1, new_position, old_position - 1)?;
            } else {
                shift_range::<F>(tx, old_parent, -1, old_position + 1, new_position)?;
            }
        } else {
            // Parents are always touched in ascending id order.
            if new_parent < old_parent {
                shift_range::<F>(tx, new_parent, 1, new_position, i64::MAX)?;
                shift_range::<F>(tx, old_parent, -1, old_position + 1, i64::MAX)?;
            } else {
                shift_range::<F>(tx, old_parent, -1, old_position + 1, i64::MAX)?;
                shift_range::<F>(tx, new_parent, 1, new_position, i64::MAX)?;
            }
        }

        tx.execute(
            &format!(
                "UPDATE {table}
                 SET {parent} = ?2,
                     position = ?3,
                     updated_at = {NOW_MS_SQL}
                 WHERE {id} = ?1
                   AND is_deleted = 0;",
                table = F::TABLE,
                parent = F::PARENT_COLUMN,
                id = F::ID_COLUMN,
            ),
            params![child_id.to_string(), new_parent.to_string(), new_position],
        )?;

        relocation.moved = true;
        Ok(relocation)
    }

    /// Lists living children of `parent_id` in position order.
    pub fn slots(conn: &Connection, parent_id: Uuid) -> PositionResult<Vec<Slot>> {
        list_slots::<F>(conn, parent_id)
    }

    /// Returns whether `parent_id`'s living children hold exactly `0..n`.
    pub fn is_dense(conn: &Connection, parent_id: Uuid) -> PositionResult<bool> {
        let slots = list_slots::<F>(conn, parent_id)?;
        Ok(slots
            .iter()
            .enumerate()
            .all(|(index, slot)| slot.position == index as i64))
    }
}

/// Failure that the write-transaction log line can classify.
pub(crate) trait LoggedFailure: std::fmt::Display + From<PositionError> {
    fn code(&self) -> &'static str;
    /// Faults log at `error`, rejections at `warn`.
    fn is_fault(&self) -> bool;
}

impl LoggedFailure for PositionError {
    fn code(&self) -> &'static str {
        PositionError::code(self)
    }

    fn is_fault(&self) -> bool {
        matches!(self, Self::Db(_) | Self::InvalidData(_))
    }
}

/// Runs `body` in one write-locked transaction and logs the outcome.
///
/// Begin and commit failures map through `PositionError`, so lock
/// contention surfaces as a retryable conflict for every caller.
pub(crate) fn run<F, T, E>(
    op: &'static str,
    target: Uuid,
    conn: &Connection,
    body: impl FnOnce(&Transaction<'_>) -> Result<T, E>,
) -> Result<T, E>
where
    F: OrderedFamily,
    E: LoggedFailure,
{
    let started_at = Instant::now();
    let result = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|err| E::from(PositionError::from(err)))
        .and_then(|tx| {
            let value = body(&tx)?;
            tx.commit()
                .map_err(|err| E::from(PositionError::from(err)))?;
            Ok(value)
        });

    match &result {
        Ok(_) => info!(
            "event=position_{} module=position status=ok kind={} target={} duration_ms={}",
            op,
            F::CHILD,
            target,
            started_at.elapsed().as_millis()
        ),
        Err(err) if err.is_fault() => error!(
            "event=position_{} module=position status=error kind={} target={} duration_ms={} error_code={} error={}",
            op,
            F::CHILD,
            target,
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
        Err(err) => warn!(
            "event=position_{} module=position status=rejected kind={} target={} duration_ms={} error_code={}",
            op,
            F::CHILD,
            target,
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
    result
}

fn ensure_parent_alive<F: OrderedFamily>(conn: &Connection, parent_id: Uuid) -> PositionResult<()> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(
                SELECT 1
                FROM {table}
                WHERE {id} = ?1
                  AND is_deleted = 0
            );",
            table = F::PARENT_TABLE,
            id = F::PARENT_ID_COLUMN,
        ),
        [parent_id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(PositionError::ParentNotFound {
            kind: F::PARENT,
            id: parent_id,
        })
    }
}

fn load_child<F: OrderedFamily>(conn: &Connection, child_id: Uuid) -> PositionResult<(Uuid, i64)> {
    let row: Option<(String, i64)> = conn
        .query_row(
            &format!(
                "SELECT {parent}, position
                 FROM {table}
                 WHERE {id} = ?1
                   AND is_deleted = 0;",
                parent = F::PARENT_COLUMN,
                table = F::TABLE,
                id = F::ID_COLUMN,
            ),
            [child_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (parent_text, position) = row.ok_or(PositionError::NotFound {
        kind: F::CHILD,
        id: child_id,
    })?;
    Ok((parse_uuid::<F>(&parent_text, F::PARENT_COLUMN)?, position))
}

fn living_count<F: OrderedFamily>(conn: &Connection, parent_id: Uuid) -> PositionResult<i64> {
    let count = conn.query_row(
        &format!(
            "SELECT COUNT(*)
             FROM {table}
             WHERE {parent} = ?1
               AND is_deleted = 0;",
            table = F::TABLE,
            parent = F::PARENT_COLUMN,
        ),
        [parent_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn list_slots<F: OrderedFamily>(conn: &Connection, parent_id: Uuid) -> PositionResult<Vec<Slot>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {id}, position
         FROM {table}
         WHERE {parent} = ?1
           AND is_deleted = 0
         ORDER BY position ASC, {id} ASC;",
        id = F::ID_COLUMN,
        table = F::TABLE,
        parent = F::PARENT_COLUMN,
    ))?;
    let mut rows = stmt.query([parent_id.to_string()])?;
    let mut slots = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get(0)?;
        slots.push(Slot {
            id: parse_uuid::<F>(&id_text, F::ID_COLUMN)?,
            position: row.get(1)?,
        });
    }
    Ok(slots)
}

/// Adds `delta` to the position of living children of `parent_id` whose
/// position lies in `from..=to`.
fn shift_range<F: OrderedFamily>(
    conn: &Connection,
    parent_id: Uuid,
    delta: i64,
    from: i64,
    to: i64,
) -> PositionResult<usize> {
    let changed = conn.execute(
        &format!(
            "UPDATE {table}
             SET position = position + ?2,
                 updated_at = {NOW_MS_SQL}
             WHERE {parent} = ?1
               AND is_deleted = 0
               AND position BETWEEN ?3 AND ?4;",
            table = F::TABLE,
            parent = F::PARENT_COLUMN,
        ),
        params![parent_id.to_string(), delta, from, to],
    )?;
    Ok(changed)
}

fn validate_reorder_set(parent_id: Uuid, current: &[Slot], ordered: &[Uuid]) -> PositionResult<()> {
    let living: HashSet<Uuid> = current.iter().map(|slot| slot.id).collect();
    let mut seen = HashSet::with_capacity(ordered.len());
    let mut unexpected = Vec::new();
    let mut duplicates = Vec::new();

    for id in ordered {
        if !living.contains(id) {
            unexpected.push(*id);
        } else if !seen.insert(*id) {
            duplicates.push(*id);
        }
    }
    let missing: Vec<Uuid> = current
        .iter()
        .map(|slot| slot.id)
        .filter(|id| !seen.contains(id))
        .collect();

    if missing.is_empty() && unexpected.is_empty() && duplicates.is_empty() {
        return Ok(());
    }
    Err(PositionError::InvalidSet {
        parent_id,
        missing,
        unexpected,
        duplicates,
    })
}

fn parse_uuid<F: OrderedFamily>(value: &str, column: &'static str) -> PositionResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        PositionError::InvalidData(format!("invalid uuid `{value}` in {}.{column}", F::TABLE))
    })
}

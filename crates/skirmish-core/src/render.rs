//! Console snapshot of the field.
//!
//! The field is scaled down to a square board of `cells × cells`. A cell
//! shows `[D]`, `[E]` or `[K]` for a live agent, `[.]` for a corpse, and
//! `[ ]` when empty. Live agents take precedence over corpses; among live
//! agents sharing a cell the first in roster order is shown.

use std::fmt::Write;
use std::sync::Arc;

use skirmish_agents::Agent;
use skirmish_types::{Bounds, Kind, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Corpse,
    Live(Kind),
}

/// Map one coordinate onto a board axis of `cells` columns.
fn scale(coord: u32, extent: u32, cells: u32) -> usize {
    let last = u64::from(cells.saturating_sub(1));
    let scaled = u64::from(coord)
        .saturating_mul(u64::from(cells))
        .checked_div(u64::from(extent))
        .unwrap_or(0)
        .min(last);
    usize::try_from(scaled).unwrap_or(0)
}

fn cell_index(pos: Position, bounds: Bounds, cells: u32) -> Option<usize> {
    let column = scale(pos.x, bounds.width, cells);
    let row = scale(pos.y, bounds.height, cells);
    usize::try_from(cells)
        .ok()?
        .checked_mul(row)?
        .checked_add(column)
}

/// Render the roster as a `cells × cells` board, one row per line.
///
/// Returns an empty string when `cells` is zero.
pub fn render_grid(agents: &[Arc<Agent>], bounds: Bounds, cells: u32) -> String {
    let side = usize::try_from(cells).unwrap_or(0);
    let mut board = vec![Cell::Empty; side.saturating_mul(side)];

    for agent in agents {
        let Some(slot) = cell_index(agent.position(), bounds, cells).and_then(|i| board.get_mut(i))
        else {
            continue;
        };
        let mark = if agent.is_alive() {
            Cell::Live(agent.kind())
        } else {
            Cell::Corpse
        };
        match (*slot, mark) {
            (Cell::Empty, _) | (Cell::Corpse, Cell::Live(_)) => *slot = mark,
            _ => {}
        }
    }

    let mut out = String::with_capacity(board.len().saturating_mul(3).saturating_add(side));
    for row in board.chunks(side.max(1)) {
        for cell in row {
            let _ = match cell {
                Cell::Empty => out.write_str("[ ]"),
                Cell::Corpse => out.write_str("[.]"),
                Cell::Live(kind) => write!(out, "[{}]", kind.glyph()),
            };
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn agent(kind: Kind, x: u32, y: u32) -> Arc<Agent> {
        Arc::new(Agent::new(kind, Position::new(x, y)))
    }

    #[test]
    fn empty_field_renders_blank_cells() {
        let grid = render_grid(&[], Bounds::new(100, 100), 2);
        assert_eq!(grid, "[ ][ ]\n[ ][ ]\n");
    }

    #[test]
    fn agents_land_in_scaled_cells() {
        let agents = vec![
            agent(Kind::Dragon, 0, 0),
            agent(Kind::Elf, 99, 0),
            agent(Kind::KnightErrant, 50, 99),
        ];
        let grid = render_grid(&agents, Bounds::new(100, 100), 2);
        assert_eq!(grid, "[D][E]\n[ ][K]\n");
    }

    #[test]
    fn corpses_are_dots_and_live_agents_win() {
        let corpse = agent(Kind::Dragon, 10, 10);
        assert!(corpse.mark_dead());
        let lone_corpse = agent(Kind::Elf, 90, 90);
        assert!(lone_corpse.mark_dead());
        let agents = vec![corpse, agent(Kind::Elf, 12, 12), lone_corpse];

        let grid = render_grid(&agents, Bounds::new(100, 100), 2);
        assert_eq!(grid, "[E][ ]\n[ ][.]\n");
    }

    #[test]
    fn default_board_has_twenty_rows() {
        let agents = vec![agent(Kind::Dragon, 99, 99)];
        let grid = render_grid(&agents, Bounds::new(100, 100), 20);
        let rows: Vec<&str> = grid.lines().collect();
        assert_eq!(rows.len(), 20);
        assert!(rows.iter().all(|row| row.len() == 60));
        assert!(rows.last().unwrap().ends_with("[D]"));
    }

    #[test]
    fn zero_cells_renders_nothing() {
        assert!(render_grid(&[agent(Kind::Elf, 1, 1)], Bounds::new(10, 10), 0).is_empty());
    }
}

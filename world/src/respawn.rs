use beast_core::{CellCoord, Direction, Terrain};

use crate::World;

/// Orthogonally adjacent beasts at which a cell stops counting as safe.
const CROWDED_NEIGHBOURS: usize = 2;

/// Reports whether the player could re-enter the level on `cell`.
///
/// The cell must be open floor without a beast or an egg, and fewer than two
/// beasts may stand orthogonally next to it.
#[must_use]
pub fn is_safe_cell(world: &World, cell: CellCoord) -> bool {
    if world.terrain.get(cell) != Some(Terrain::Empty) {
        return false;
    }
    if world.beasts.iter().any(|beast| beast.cell == cell)
        || world.eggs.iter().any(|egg| egg.cell == cell)
    {
        return false;
    }
    let adjacent = Direction::CARDINALS
        .into_iter()
        .filter_map(|direction| world.terrain.neighbour(cell, direction))
        .filter(|next| world.beasts.iter().any(|beast| beast.cell == *next))
        .count();
    adjacent < CROWDED_NEIGHBOURS
}

/// Picks the respawn cell: the spawn when safe, otherwise the first safe cell
/// on the nearest square ring around it in row-major order.
pub(crate) fn select_cell(world: &World) -> CellCoord {
    let spawn = world.player.spawn;
    if is_safe_cell(world, spawn) {
        return spawn;
    }

    let (columns, rows) = world.terrain.dimensions();
    let max_radius = i64::from(columns.max(rows));
    for radius in 1..=max_radius {
        let mut candidates = ring(spawn, radius, columns, rows);
        if let Some(cell) = candidates.find(|cell| is_safe_cell(world, *cell)) {
            return cell;
        }
    }
    spawn
}

fn ring(
    centre: CellCoord,
    radius: i64,
    columns: u32,
    rows: u32,
) -> impl Iterator<Item = CellCoord> {
    let centre_column = i64::from(centre.column());
    let centre_row = i64::from(centre.row());
    (centre_row - radius..=centre_row + radius).flat_map(move |row| {
        (centre_column - radius..=centre_column + radius).filter_map(move |column| {
            let on_ring =
                (row - centre_row).abs() == radius || (column - centre_column).abs() == radius;
            if !on_ring {
                return None;
            }
            let column = u32::try_from(column).ok().filter(|column| *column < columns)?;
            let row = u32::try_from(row).ok().filter(|row| *row < rows)?;
            Some(CellCoord::new(column, row))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::ring;
    use beast_core::CellCoord;

    #[test]
    fn ring_is_row_major_and_clipped() {
        let cells: Vec<_> = ring(CellCoord::new(0, 0), 1, 5, 5).collect();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
            ]
        );
    }

    #[test]
    fn ring_skips_the_interior() {
        let cells: Vec<_> = ring(CellCoord::new(2, 2), 2, 5, 5).collect();
        assert_eq!(cells.len(), 16);
        assert!(!cells.contains(&CellCoord::new(2, 2)));
        assert!(!cells.contains(&CellCoord::new(1, 1)));
        assert_eq!(cells.first(), Some(&CellCoord::new(0, 0)));
        assert_eq!(cells.last(), Some(&CellCoord::new(4, 4)));
    }
}

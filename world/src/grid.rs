use beast_core::{CellCoord, Direction, Terrain, TerrainView};

/// Dense row-major terrain storage.
#[derive(Clone, Debug)]
pub(crate) struct TerrainGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Terrain>,
}

impl TerrainGrid {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![Terrain::Empty; capacity],
        }
    }

    pub(crate) fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Neighbour in the given direction, or `None` when it lies off the grid.
    pub(crate) fn neighbour(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        cell.step(direction).filter(|next| self.contains(*next))
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<Terrain> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    pub(crate) fn set(&mut self, cell: CellCoord, terrain: Terrain) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = terrain;
            }
        }
    }

    pub(crate) fn view(&self) -> TerrainView<'_> {
        TerrainView::new(&self.cells, self.columns, self.rows)
    }

    pub(crate) fn cells(&self) -> &[Terrain] {
        &self.cells
    }

    pub(crate) const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TerrainGrid;
    use beast_core::{CellCoord, Direction, Terrain};

    #[test]
    fn neighbours_respect_both_edges() {
        let grid = TerrainGrid::new(3, 2);
        assert_eq!(grid.neighbour(CellCoord::new(0, 0), Direction::West), None);
        assert_eq!(grid.neighbour(CellCoord::new(2, 1), Direction::East), None);
        assert_eq!(grid.neighbour(CellCoord::new(2, 1), Direction::South), None);
        assert_eq!(
            grid.neighbour(CellCoord::new(1, 0), Direction::SouthWest),
            Some(CellCoord::new(0, 1))
        );
    }

    #[test]
    fn set_ignores_out_of_bounds_cells() {
        let mut grid = TerrainGrid::new(2, 2);
        grid.set(CellCoord::new(1, 1), Terrain::Block);
        grid.set(CellCoord::new(5, 5), Terrain::Wall);
        assert_eq!(grid.get(CellCoord::new(1, 1)), Some(Terrain::Block));
        assert_eq!(grid.get(CellCoord::new(5, 5)), None);
        assert_eq!(grid.cells().len(), 4);
    }
}

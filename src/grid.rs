//! Row-major grid of subplot cells with an active-cell cursor.

use crate::Error;

#[derive(Debug, Clone)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
    active: (usize, usize),
}

impl<T> Grid<T> {
    /// Build a `rows` × `cols` grid whose cell `(r, c)` is `f(r, c)`.
    /// Cells are created row by row.  The cursor starts on `(0, 0)`.
    pub fn try_from_fn<E>(
        rows: usize, cols: usize,
        mut f: impl FnMut(usize, usize) -> Result<T, E>
    ) -> Result<Self, E>
    where E: From<Error> {
        if rows == 0 || cols == 0 {
            return Err(Error::EmptyGrid { rows, cols }.into());
        }
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0 .. rows {
            for c in 0 .. cols {
                cells.push(f(r, c)?);
            }
        }
        Ok(Grid { rows, cols, cells, active: (0, 0) })
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn cols(&self) -> usize { self.cols }

    fn index(&self, row: usize, col: usize) -> Result<usize, Error> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::InvalidSubplot { row, col });
        }
        Ok(row * self.cols + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<&T, Error> {
        let i = self.index(row, col)?;
        Ok(&self.cells[i])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Result<&mut T, Error> {
        let i = self.index(row, col)?;
        Ok(&mut self.cells[i])
    }

    /// Move the cursor.  The cursor is left untouched on error.
    pub fn set_active(&mut self, row: usize, col: usize) -> Result<(), Error> {
        self.index(row, col)?;
        self.active = (row, col);
        Ok(())
    }

    pub fn active(&self) -> (usize, usize) { self.active }

    pub fn active_cell(&self) -> &T {
        let (r, c) = self.active;
        &self.cells[r * self.cols + c]
    }

    pub fn active_cell_mut(&mut self) -> &mut T {
        let (r, c) = self.active;
        &mut self.cells[r * self.cols + c]
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }
}

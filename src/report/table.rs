use std::{cmp::max, fmt::Alignment, io::Write};

use rust_decimal::Decimal;

#[derive(Debug)]
pub struct Table {
    pub width: usize,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            rows: Default::default(),
        }
    }

    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row)
    }
}

#[derive(Debug)]
pub enum Row {
    /// Rows shorter than the table are padded with empty cells.
    Cells(Vec<Cell>),
    Separator,
}

#[derive(Debug)]
pub enum Cell {
    Empty,
    Decimal(Decimal),
    Text {
        text: String,
        align: Alignment,
        indent: usize,
    },
}

impl Cell {
    pub fn text(text: &str) -> Self {
        Self::indented(text, 0)
    }

    pub fn indented(text: &str, indent: usize) -> Self {
        Self::Text {
            text: text.to_string(),
            align: Alignment::Left,
            indent,
        }
    }
}

pub struct TextRenderer {
    pub table: Table,
    pub round: u32,
}

impl TextRenderer {
    pub fn new(table: Table, round: u32) -> Self {
        Self { table, round }
    }

    pub fn render<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let widths = self.compute_widths();
        for row in &self.table.rows {
            match row {
                Row::Separator => self.print_separator_row(w, &widths)?,
                Row::Cells(cells) => self.print_regular_row(w, &widths, cells)?,
            }
        }
        Ok(())
    }

    fn print_separator_row<W: Write>(&self, w: &mut W, widths: &[usize]) -> std::io::Result<()> {
        write!(w, "+")?;
        for width in widths {
            write!(w, "-{}-+", "-".repeat(*width))?;
        }
        writeln!(w)
    }

    fn print_regular_row<W: Write>(
        &self,
        w: &mut W,
        widths: &[usize],
        cells: &[Cell],
    ) -> std::io::Result<()> {
        write!(w, "|")?;
        for (i, width) in widths.iter().copied().enumerate() {
            match cells.get(i).unwrap_or(&Cell::Empty) {
                Cell::Empty => write!(w, "{}", " ".repeat(width + 2))?,
                Cell::Decimal(value) => write!(w, " {:>1$} ", self.format_decimal(*value), width)?,
                Cell::Text {
                    text,
                    align,
                    indent,
                } => {
                    write!(w, " {}", " ".repeat(*indent))?;
                    let width = width - indent;
                    match align {
                        Alignment::Left => write!(w, "{text:<width$} ")?,
                        Alignment::Right => write!(w, "{text:>width$} ")?,
                        Alignment::Center => write!(w, "{text:^width$} ")?,
                    }
                }
            }
            write!(w, "|")?
        }
        writeln!(w)
    }

    fn format_decimal(&self, value: Decimal) -> String {
        let mut value = value.round_dp(self.round);
        value.rescale(self.round);
        value.to_string()
    }

    fn compute_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.table.width];
        for row in &self.table.rows {
            if let Row::Cells(cells) = row {
                for (i, cell) in cells.iter().enumerate().take(widths.len()) {
                    widths[i] = max(widths[i], self.min_length(cell));
                }
            }
        }
        widths
    }

    fn min_length(&self, c: &Cell) -> usize {
        match c {
            Cell::Empty => 0,
            Cell::Decimal(value) => self.format_decimal(*value).chars().count(),
            Cell::Text { text, indent, .. } => text.chars().count() + indent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render() {
        let mut table = Table::new(3);
        table.add_row(Row::Separator);
        table.add_row(Row::Cells(vec![Cell::text("Assets")]));
        table.add_row(Row::Cells(vec![
            Cell::indented("cash", 2),
            Cell::Decimal(Decimal::new(12345, 1)),
            Cell::text("USD"),
        ]));
        table.add_row(Row::Cells(vec![
            Cell::indented("broker", 2),
            Cell::Decimal(Decimal::new(-5, 0)),
            Cell::text("AAPL"),
        ]));
        table.add_row(Row::Separator);

        let mut out = Vec::new();
        TextRenderer::new(table, 2).render(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "+----------+---------+------+\n\
             | Assets   |         |      |\n\
             |   cash   | 1234.50 | USD  |\n\
             |   broker |   -5.00 | AAPL |\n\
             +----------+---------+------+\n"
        );
    }

    #[test]
    fn test_round() {
        let r = TextRenderer::new(Table::new(0), 0);
        assert_eq!(r.format_decimal(Decimal::new(25, 1)), "2");
        assert_eq!(r.format_decimal(Decimal::new(35, 1)), "4");
    }
}

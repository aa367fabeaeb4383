//! Table Populator: writes a cell matrix into a template table of fixed size.

use crate::text::{ensure_text_body, text_body_text, write_text_body};
use crate::xml::XmlElement;
use pptfill_core::{Error, Result, TableMatrix};

/// The `a:tbl` inside a table graphic frame.
pub fn table_element(frame: &XmlElement) -> Option<&XmlElement> {
    frame.find(&["graphic", "graphicData", "tbl"])
}

fn table_element_mut(frame: &mut XmlElement) -> Option<&mut XmlElement> {
    frame.find_mut(&["graphic", "graphicData", "tbl"])
}

/// Fill a table graphic frame from `matrix`.
///
/// Matrix row `r` lands on template row `r`, or `r + 1` when `skip_header`
/// keeps the template's header. Template rows and cells without data are
/// cleared; cell properties stay as they are. Data beyond the template's
/// rows or columns is dropped. The table never changes size.
pub fn populate_table(frame: &mut XmlElement, matrix: &TableMatrix, skip_header: bool) -> Result<()> {
    let table = table_element_mut(frame)
        .ok_or_else(|| Error::Internal("graphic frame holds no table".to_string()))?;
    let offset = usize::from(skip_header);

    let template_rows = table.children_named("tr").count();
    if matrix.row_count() + offset > template_rows {
        log::warn!(
            "Table has {} row(s); dropping {} extra data row(s)",
            template_rows,
            matrix.row_count() + offset - template_rows
        );
    }

    for (r, row) in table.children_named_mut("tr").enumerate().skip(offset) {
        let data = matrix.row(r - offset);
        for (c, cell) in row.children_named_mut("tc").enumerate() {
            let text = data.and_then(|cells| cells.get(c)).map_or("", String::as_str);
            write_text_body(ensure_text_body(cell, "a")?, text);
        }
    }

    Ok(())
}

/// Cell text of every row, header included.
pub fn table_text(table: &XmlElement) -> Vec<Vec<String>> {
    table
        .children_named("tr")
        .map(|row| {
            row.children_named("tc")
                .map(|cell| cell.child("txBody").map(text_body_text).unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Number of grid columns, falling back to the widest row.
pub fn column_count(table: &XmlElement) -> usize {
    let grid = table
        .child("tblGrid")
        .map(|grid| grid.children_named("gridCol").count())
        .unwrap_or(0);
    if grid > 0 {
        return grid;
    }
    table
        .children_named("tr")
        .map(|row| row.children_named("tc").count())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::table_frame;

    fn frame() -> XmlElement {
        table_frame("plan", &[&["Step", "Owner"], &["Draft", "Ann"], &["Ship", "Bo"]])
    }

    fn cells(frame: &XmlElement) -> Vec<Vec<String>> {
        table_text(table_element(frame).unwrap())
    }

    #[test]
    fn test_overwrites_header_and_rows() {
        let mut frame = frame();
        let matrix = TableMatrix::from_rows(vec![
            vec!["Task", "Who"],
            vec!["Plan", "Cy"],
            vec!["Test", "Di"],
        ]);
        populate_table(&mut frame, &matrix, false).unwrap();
        assert_eq!(
            cells(&frame),
            vec![vec!["Task", "Who"], vec!["Plan", "Cy"], vec!["Test", "Di"]]
        );
    }

    #[test]
    fn test_short_matrix_clears_remaining_rows_and_keeps_cell_styling() {
        let mut frame = frame();
        let matrix = TableMatrix::from_rows(vec![vec!["Task", "Who"], vec!["Plan"]]);
        populate_table(&mut frame, &matrix, false).unwrap();

        assert_eq!(
            cells(&frame),
            vec![vec!["Task", "Who"], vec!["Plan", ""], vec!["", ""]]
        );

        let table = table_element(&frame).unwrap();
        let last_row = table.children_named("tr").nth(2).unwrap();
        for cell in last_row.children_named("tc") {
            let fill = cell.find(&["tcPr", "solidFill", "srgbClr"]).unwrap();
            assert_eq!(fill.attr("val"), Some("EEEEEE"));
        }
        assert_eq!(table.children_named("tr").count(), 3);
    }

    #[test]
    fn test_extra_rows_and_columns_are_dropped() {
        let mut frame = frame();
        let matrix = TableMatrix::from_rows(vec![
            vec!["A", "B", "C"],
            vec!["1", "2", "3"],
            vec!["4", "5", "6"],
            vec!["7", "8", "9"],
        ]);
        populate_table(&mut frame, &matrix, false).unwrap();
        assert_eq!(
            cells(&frame),
            vec![vec!["A", "B"], vec!["1", "2"], vec!["4", "5"]]
        );
    }

    #[test]
    fn test_skip_header_keeps_template_header() {
        let mut frame = frame();
        let matrix = TableMatrix::from_rows(vec![vec!["Review", "Eve"]]);
        populate_table(&mut frame, &matrix, true).unwrap();
        assert_eq!(
            cells(&frame),
            vec![vec!["Step", "Owner"], vec!["Review", "Eve"], vec!["", ""]]
        );
    }

    #[test]
    fn test_cells_accept_markdown() {
        let mut frame = frame();
        let matrix = TableMatrix::from_rows(vec![vec!["**Bold** head", "x"]]);
        populate_table(&mut frame, &matrix, false).unwrap();

        let table = table_element(&frame).unwrap();
        let first = table.find(&["tr", "tc", "txBody", "p"]).unwrap();
        let runs: Vec<_> = first.children_named("r").collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].child("rPr").unwrap().attr("b"), Some("1"));
        assert_eq!(cells(&frame)[0][0], "Bold head");
    }

    #[test]
    fn test_cell_without_text_body_gets_one_before_cell_properties() {
        let mut frame = frame();
        let table = table_element_mut(&mut frame).unwrap();
        let cell = table
            .children_named_mut("tr")
            .nth(1)
            .and_then(|row| row.children_named_mut("tc").next())
            .unwrap();
        cell.remove_children("txBody");

        let matrix = TableMatrix::from_rows(vec![vec!["Step", "Owner"], vec!["Plan", "Cy"]]);
        populate_table(&mut frame, &matrix, false).unwrap();

        let table = table_element(&frame).unwrap();
        let cell = table
            .children_named("tr")
            .nth(1)
            .and_then(|row| row.children_named("tc").next())
            .unwrap();
        let order: Vec<_> = cell.elements().map(|el| el.name.as_str()).collect();
        assert_eq!(order, vec!["a:txBody", "a:tcPr"]);
        assert_eq!(cells(&frame)[1][0], "Plan");
    }

    #[test]
    fn test_column_count() {
        let frame = frame();
        assert_eq!(column_count(table_element(&frame).unwrap()), 2);
    }
}

use gdp_atlas_query::{normalize_csv, Cell, Column, ColumnType, TabularResult};
use proptest::prelude::*;

fn coerced_eq(a: &Cell, b: &Cell) -> bool {
    match (a, b) {
        (Cell::Null, Cell::Null) => true,
        (Cell::Text(x), Cell::Text(y)) => x == y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn column_strategy(rows: usize) -> impl Strategy<Value = (ColumnType, Vec<Cell>)> {
    prop_oneof![
        prop::collection::vec(prop::option::of(any::<i64>()), rows).prop_map(|v| {
            (
                ColumnType::Integer,
                v.into_iter().map(|x| x.map_or(Cell::Null, Cell::Integer)).collect(),
            )
        }),
        prop::collection::vec(prop::option::of(-1.0e12f64..1.0e12f64), rows).prop_map(|v| {
            (
                ColumnType::Real,
                v.into_iter().map(|x| x.map_or(Cell::Null, Cell::Real)).collect(),
            )
        }),
        prop::collection::vec(prop::option::of("[A-Za-z][A-Za-z ,\"]{0,8}"), rows).prop_map(
            |v| {
                (
                    ColumnType::Text,
                    v.into_iter().map(|x| x.map_or(Cell::Null, Cell::Text)).collect(),
                )
            }
        ),
    ]
}

fn table_strategy() -> impl Strategy<Value = TabularResult> {
    (0usize..12, 1usize..6).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(column_strategy(rows), cols).prop_map(|columns| {
            let columns = columns
                .into_iter()
                .enumerate()
                .map(|(i, (ty, values))| Column::new(format!("col_{i}"), ty, values))
                .collect();
            TabularResult::from_columns(columns).expect("generated table is well formed")
        })
    })
}

proptest! {
    #[test]
    fn csv_round_trip_preserves_shape_and_values(table in table_strategy()) {
        let text = table.to_csv().expect("encode");
        let back = normalize_csv(&text).expect("decode");
        prop_assert_eq!(back.row_count(), table.row_count());
        prop_assert_eq!(back.column_names(), table.column_names());
        for (left, right) in table.columns().iter().zip(back.columns()) {
            for (a, b) in left.values.iter().zip(&right.values) {
                prop_assert!(coerced_eq(a, b), "{:?} != {:?} in {}", a, b, left.name);
            }
        }
    }

    #[test]
    fn n_rows_by_m_columns_in_header_order(
        names in prop::collection::vec("[a-z][a-z0-9_]{0,6}", 1..6),
        rows in 0usize..15,
    ) {
        let names: Vec<String> = names
            .into_iter()
            .enumerate()
            .map(|(i, n)| format!("{n}_{i}"))
            .collect();
        let mut text = names.join(",");
        text.push('\n');
        for r in 0..rows {
            let line: Vec<String> = (0..names.len()).map(|c| (r * 10 + c).to_string()).collect();
            text.push_str(&line.join(","));
            text.push('\n');
        }
        let table = normalize_csv(&text).expect("valid csv");
        prop_assert_eq!(table.row_count(), rows);
        prop_assert_eq!(table.column_count(), names.len());
        let got: Vec<String> = table.column_names().into_iter().map(str::to_string).collect();
        prop_assert_eq!(got, names);
    }
}

use std::path::{Path, PathBuf};

/// Config declaring the hotel booking columns, stratified on `children`.
pub const HOTEL_CONFIG: &str = r#"
label_column = "children"
seed = 1234

[[columns]]
name = "lead_time"
type = "numeric"

[[columns]]
name = "meal"
type = "factor"

[[columns]]
name = "comment"
type = "text"

[[columns]]
name = "children"
type = "factor"

[split]
held_out_fraction = 0.25
validation_fraction = 0.2
folds = 5

[logging]
file = false
"#;

/// Write `rows` bookings where every tenth booking has children.
///
/// Bookings with children have short lead times, so the label is learnable.
pub fn write_hotel_csv(dir: &Path, rows: usize) -> PathBuf {
    let meals = ["BB", "HB", "FB", "SC"];
    let mut text = String::from("booking_id,lead_time,meal,comment,children\n");
    for i in 0..rows {
        let children = i % 10 == 0;
        let lead_time = if i % 17 == 3 {
            "NA".to_string()
        } else if children {
            format!("{}", 5 + i % 11)
        } else {
            format!("{}", 60 + i % 23)
        };
        let label = if children { "children" } else { "none" };
        text.push_str(&format!(
            "{i},{lead_time},{},\"note {i}, booked online\",{label}\n",
            meals[i % meals.len()]
        ));
    }
    let path = dir.join("hotels.csv");
    std::fs::write(&path, text).unwrap();
    path
}

pub fn write_config(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("strata.toml");
    std::fs::write(&path, text).unwrap();
    path
}

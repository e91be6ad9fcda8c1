use std::path::Path;

use serde::{Deserialize, Serialize};

/// One row of the rents table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AreaCost {
    pub area: String,
    pub avg_rent_1br_gbp: i64,
    pub avg_rent_2br_gbp: i64,
    pub supermarket_index: f64,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    area: String,
    #[serde(default)]
    avg_rent_1br_gbp: String,
    #[serde(default)]
    avg_rent_2br_gbp: String,
    #[serde(default)]
    supermarket_index: String,
}

impl From<RawRow> for AreaCost {
    fn from(raw: RawRow) -> Self {
        AreaCost {
            area: raw.area.trim().to_string(),
            avg_rent_1br_gbp: raw.avg_rent_1br_gbp.trim().parse().unwrap_or(0),
            avg_rent_2br_gbp: raw.avg_rent_2br_gbp.trim().parse().unwrap_or(0),
            supermarket_index: raw
                .supermarket_index
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(1.0),
        }
    }
}

/// Reads the rents CSV. A missing or unreadable file yields an empty list;
/// unparseable rows are skipped with a warning.
pub fn load_areas(path: &Path) -> Vec<AreaCost> {
    let mut reader = match csv::ReaderBuilder::new().trim(csv::Trim::Headers).flexible(true).from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            log::warn!("Cost of living data unavailable at {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut areas = Vec::new();
    for (line, record) in reader.deserialize::<RawRow>().enumerate() {
        match record {
            Ok(raw) => areas.push(AreaCost::from(raw)),
            Err(e) => log::warn!("Skipping cost of living row {} in {}: {}", line + 2, path.display(), e),
        }
    }
    areas
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "area,avg_rent_1br_gbp,avg_rent_2br_gbp,supermarket_index").unwrap();
        writeln!(file, "Leeds,850,1050,0.97").unwrap();
        writeln!(file, "Hull,n/a,,cheap").unwrap();
        file.flush().unwrap();

        let areas = load_areas(file.path());
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0], AreaCost { area: "Leeds".into(), avg_rent_1br_gbp: 850, avg_rent_2br_gbp: 1050, supermarket_index: 0.97 });
        assert_eq!(areas[1].avg_rent_1br_gbp, 0);
        assert_eq!(areas[1].avg_rent_2br_gbp, 0);
        assert_eq!(areas[1].supermarket_index, 1.0);
    }

    #[test]
    fn negative_rents_are_kept() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "area,avg_rent_1br_gbp,avg_rent_2br_gbp,supermarket_index").unwrap();
        writeln!(file, "Rebate Town,-50,-120,0.9").unwrap();
        file.flush().unwrap();

        let areas = load_areas(file.path());
        assert_eq!(areas[0].avg_rent_1br_gbp, -50);
        assert_eq!(areas[0].avg_rent_2br_gbp, -120);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_areas(&dir.path().join("absent.csv")).is_empty());
    }
}

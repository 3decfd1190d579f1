#![allow(dead_code)]

use chrono::NaiveDate;
use energy_community::DirectoryFeed;
use std::path::Path;
use tempfile::TempDir;

/// Scratch data directory, removed when dropped.
pub struct DataDir {
    dir: TempDir,
}

impl DataDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create data dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, file: &str, contents: &str) {
        std::fs::write(self.path().join(file), contents).expect("write fixture");
    }

    pub fn feed(&self) -> DirectoryFeed {
        DirectoryFeed::new(self.path()).with_ingested_on(ingest_date())
    }
}

pub fn ingest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid ingest date")
}

fn square(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> String {
    format!(
        "[[[{min_lng},{min_lat}],[{max_lng},{min_lat}],[{max_lng},{max_lat}],[{min_lng},{max_lat}],[{min_lng},{min_lat}]]]"
    )
}

fn feature(geoid: &str, name: &str, bounds: (f64, f64, f64, f64)) -> String {
    let (min_lng, min_lat, max_lng, max_lat) = bounds;
    format!(
        r#"{{"type":"Feature","properties":{{"GEOID":"{geoid}","NAME":"{name}"}},"geometry":{{"type":"Polygon","coordinates":{}}}}}"#,
        square(min_lng, min_lat, max_lng, max_lat)
    )
}

pub fn collection(features: &[(&str, &str, (f64, f64, f64, f64))]) -> String {
    let features: Vec<String> = features
        .iter()
        .map(|(geoid, name, bounds)| feature(geoid, name, *bounds))
        .collect();
    format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    )
}

pub const COAL_HEADER: &str = "geoid_tract_2020,Mine_Closure,Generator_Closure,Adjacent_to_Closure,State_Name,County_Name,date_last_update,dataset_version,record_added";
pub const FFE_HEADER: &str = "geoid_cty_2020,ffe_ind_qual,ec_ind_qual,state_name,county_name_2020,date_last_,dataset_ve,date_recor";
pub const PPC_HEADER: &str =
    "FIPStxt,County_name,Persistent_Poverty_2013,\"Metro-nonmetro status, 2013 0=Nonmetro 1=Metro\"";

/// Two West Virginia counties side by side, three tracts, all three datasets.
///
/// ```text
///  lng: -82   -81.5   -81   -80
///       | 54039 0001 | 0002 | 54041 0001 |
/// ```
pub fn west_virginia() -> DataDir {
    let dir = DataDir::new();
    dir.write(
        "states.geojson",
        &collection(&[("54", "West Virginia", (-83.0, 37.0, -79.0, 40.0))]),
    );
    dir.write(
        "counties.geojson",
        &collection(&[
            ("54039", "Kanawha", (-82.0, 38.0, -81.0, 39.0)),
            ("54041", "Lewis", (-81.0, 38.0, -80.0, 39.0)),
        ]),
    );
    dir.write(
        "tracts.geojson",
        &collection(&[
            ("54039000100", "1", (-82.0, 38.0, -81.5, 39.0)),
            ("54039000200", "2", (-81.5, 38.0, -81.0, 39.0)),
            ("54041000100", "1", (-81.0, 38.0, -80.0, 39.0)),
        ]),
    );
    dir.write(
        "coal_closure.csv",
        &format!(
            "{COAL_HEADER}\n\
54039000100,1,0,0,West Virginia,Kanawha County,2023-06-15,2.0,2023-06-20\n\
54039000200,0,0,1,West Virginia,Kanawha County,2023-06-15,2.0,2023-06-20\n"
        ),
    );
    dir.write(
        "ffe_unemployment.csv",
        &format!(
            "{FFE_HEADER}\n\
54039,1,0,West Virginia,Kanawha County,6/15/2023,2.0,6/20/2023\n\
54041,1,1,West Virginia,Lewis County,6/15/2023,2.0,6/20/2023\n"
        ),
    );
    dir.write(
        "persistent_poverty.csv",
        &format!("{PPC_HEADER}\n54039,Kanawha County,0,1\n54041,Lewis County,0,0\n"),
    );
    dir
}

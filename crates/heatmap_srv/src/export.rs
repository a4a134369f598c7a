//! Read-only projections of the pin set into file formats.
//!
//! These are pure functions of a pin slice. Rendering the same slice
//! twice produces byte-identical output.

use crate::Pin;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// GeoJSON FeatureCollection of Points.
    GeoJson,

    /// `lat,lon,size,timestamp` rows.
    Csv,

    /// KML 2.2 Placemarks.
    Kml,

    /// GPX 1.1 waypoints.
    Gpx,
}

impl ExportFormat {
    /// The http content type of this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::GeoJson => "application/geo+json",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Kml => "application/vnd.google-earth.kml+xml",
            Self::Gpx => "application/gpx+xml",
        }
    }

    /// Render pins in this format.
    pub fn render(&self, pins: &[Pin]) -> String {
        match self {
            Self::GeoJson => geojson(pins),
            Self::Csv => csv(pins),
            Self::Kml => kml(pins),
            Self::Gpx => gpx(pins),
        }
    }
}

fn geojson(pins: &[Pin]) -> String {
    #[derive(serde::Serialize)]
    struct Collection {
        r#type: &'static str,
        features: Vec<Feature>,
    }

    #[derive(serde::Serialize)]
    struct Feature {
        r#type: &'static str,
        geometry: Geometry,
        properties: Properties,
    }

    #[derive(serde::Serialize)]
    struct Geometry {
        r#type: &'static str,
        coordinates: [f64; 2],
    }

    #[derive(serde::Serialize)]
    struct Properties {
        size: u8,
        ts: i64,
    }

    let fc = Collection {
        r#type: "FeatureCollection",
        features: pins
            .iter()
            .map(|p| Feature {
                r#type: "Feature",
                geometry: Geometry {
                    r#type: "Point",
                    coordinates: [p.lon, p.lat],
                },
                properties: Properties {
                    size: p.size,
                    ts: p.ts.as_millis(),
                },
            })
            .collect(),
    };

    // plain structs of finite numbers and strings always serialize
    serde_json::to_string_pretty(&fc).unwrap_or_default()
}

fn csv(pins: &[Pin]) -> String {
    let mut out = String::from("lat,lon,size,timestamp\n");
    let rows = pins
        .iter()
        .map(|p| format!("{},{},{},{}", p.lat, p.lon, p.size, p.ts))
        .collect::<Vec<_>>();
    out.push_str(&rows.join("\n"));
    out.push('\n');
    out
}

fn kml(pins: &[Pin]) -> String {
    let marks = pins
        .iter()
        .map(|p| {
            format!(
                "<Placemark><Point><coordinates>{},{},0</coordinates></Point>\
                 <ExtendedData><Data name=\"size\"><value>{}</value></Data>\
                 <Data name=\"ts\"><value>{}</value></Data></ExtendedData>\
                 </Placemark>",
                p.lon, p.lat, p.size, p.ts,
            )
        })
        .collect::<Vec<_>>()
        .join("\n    ");

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<kml xmlns=\"http://www.opengis.net/kml/2.2\">
  <Document>
    <name>Pins</name>
    {marks}
  </Document>
</kml>"
    )
}

fn gpx(pins: &[Pin]) -> String {
    let points = pins
        .iter()
        .map(|p| {
            let time = chrono::DateTime::from_timestamp_millis(p.ts.as_millis())
                .unwrap_or_default()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
            format!(
                "<wpt lat=\"{}\" lon=\"{}\"><name>size:{}</name>\
                 <time>{time}</time></wpt>",
                p.lat, p.lon, p.size,
            )
        })
        .collect::<Vec<_>>()
        .join("\n  ");

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<gpx version=\"1.1\" creator=\"realtime-heatmap\" \
xmlns=\"http://www.topografix.com/GPX/1/1\">
  {points}
</gpx>"
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Timestamp;

    fn pins() -> Vec<Pin> {
        vec![
            Pin {
                id: "a".into(),
                lat: 52.5,
                lon: 13.25,
                size: 4,
                ts: Timestamp::from_millis(1_700_000_000_000),
                created_by: "c".into(),
            },
            Pin {
                id: "b".into(),
                lat: -1.0,
                lon: 2.0,
                size: 1,
                ts: Timestamp::from_millis(1_700_000_000_123),
                created_by: "c".into(),
            },
        ]
    }

    #[test]
    fn csv_rows() {
        assert_eq!(
            "lat,lon,size,timestamp\n\
             52.5,13.25,4,1700000000000\n\
             -1,2,1,1700000000123\n",
            ExportFormat::Csv.render(&pins())
        );
    }

    #[test]
    fn csv_empty() {
        assert_eq!("lat,lon,size,timestamp\n\n", ExportFormat::Csv.render(&[]));
    }

    #[test]
    fn geojson_features() {
        let out = ExportFormat::GeoJson.render(&pins());
        assert!(out.starts_with("{\n  \"type\": \"FeatureCollection\""));

        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(2, v["features"].as_array().unwrap().len());
        assert_eq!(
            serde_json::json!([13.25, 52.5]),
            v["features"][0]["geometry"]["coordinates"]
        );
        assert_eq!(4, v["features"][0]["properties"]["size"]);
        assert_eq!(
            1_700_000_000_000_i64,
            v["features"][0]["properties"]["ts"]
        );
    }

    #[test]
    fn kml_placemarks() {
        let out = ExportFormat::Kml.render(&pins());
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(out.contains("<name>Pins</name>"));
        assert!(out.contains("<coordinates>13.25,52.5,0</coordinates>"));
        assert!(out.contains("<Data name=\"size\"><value>4</value></Data>"));
        assert_eq!(2, out.matches("<Placemark>").count());
    }

    #[test]
    fn gpx_waypoints() {
        let out = ExportFormat::Gpx.render(&pins());
        assert!(out.contains("creator=\"realtime-heatmap\""));
        assert!(out.contains(
            "<wpt lat=\"52.5\" lon=\"13.25\"><name>size:4</name>\
             <time>2023-11-14T22:13:20.000Z</time></wpt>"
        ));
        assert!(out.contains("<time>2023-11-14T22:13:20.123Z</time>"));
    }

    #[test]
    fn render_is_deterministic() {
        let p = pins();
        for f in [
            ExportFormat::GeoJson,
            ExportFormat::Csv,
            ExportFormat::Kml,
            ExportFormat::Gpx,
        ] {
            assert_eq!(f.render(&p), f.render(&p));
        }
    }
}

//! Extraction of [`ParcelRecord`]s from cadastre responses.
//!
//! Both endpoints answer with a top-level query node. An `err`/`lerr`
//! child or a non-zero `control/cuerr` counter means "no parcel here".
//! Optional numeric fields (construction year, surface) that are missing
//! or not numeric degrade to their unknown representation.

use zone_radar_zones_models::{Coordinate, ParcelRecord};

use crate::CadastreError;
use crate::xml::{XmlNode, parse_document};

/// Parses a `Consulta_CPMRC` (point query) response.
///
/// `probe` is the queried point, used as the parcel coordinate when the
/// response carries no centroid.
///
/// # Errors
///
/// Returns [`CadastreError::Malformed`] if the body is not well-formed XML.
pub fn parse_coordinate_response(
    body: &str,
    probe: Coordinate,
) -> Result<Option<ParcelRecord>, CadastreError> {
    let root = parse_document(body)?;
    Ok(parcel_at_coordinate(&root, probe))
}

/// Parses a `Consulta_DNPRC` (cadastral reference) response.
///
/// # Errors
///
/// Returns [`CadastreError::Malformed`] if the body is not well-formed XML.
pub fn parse_reference_response(body: &str) -> Result<Option<ParcelRecord>, CadastreError> {
    let root = parse_document(body)?;
    Ok(parcel_by_reference(&root))
}

fn reports_error(root: &XmlNode) -> bool {
    root.has_child("err")
        || root.has_child("lerr")
        || root
            .path(&["control", "cuerr"])
            .and_then(XmlNode::text)
            .and_then(|n| n.parse::<u32>().ok())
            .is_some_and(|n| n > 0)
}

fn parcel_at_coordinate(root: &XmlNode, probe: Coordinate) -> Option<ParcelRecord> {
    if reports_error(root) {
        return None;
    }

    let coord = root.path(&["coordenadas", "coord"])?;
    let pc = coord.child("pc")?;
    let pc1 = pc.child("pc1");
    let pc2 = pc.child("pc2");

    let reference = either_attr(pc1, pc2, "rc")
        .map(String::from)
        .unwrap_or_else(|| joined_text(&[pc1, pc2]));
    if reference.is_empty() {
        return None;
    }

    let construction_year = coord
        .child("bi")
        .and_then(|bi| bi.attr("ant"))
        .or_else(|| either_attr(pc1, pc2, "ant"))
        .and_then(parse_year);

    let coordinate = coord
        .child("geo")
        .and_then(|geo| {
            let lon = geo.child_text("xcen")?.parse::<f64>().ok()?;
            let lat = geo.child_text("ycen")?.parse::<f64>().ok()?;
            Some(Coordinate::new(lat, lon))
        })
        .filter(Coordinate::is_valid)
        .unwrap_or(probe);

    Some(ParcelRecord {
        reference,
        address: coord.child_text("ldt").map(String::from),
        usage: either_attr(pc1, pc2, "use").map(String::from),
        floor_area_m2: either_attr(pc1, pc2, "sfc")
            .and_then(parse_area)
            .unwrap_or(0.0),
        construction_year,
        coordinate: Some(coordinate),
    })
}

fn parcel_by_reference(root: &XmlNode) -> Option<ParcelRecord> {
    if reports_error(root) {
        return None;
    }

    let bi = root.path(&["bico", "bi"])?;

    let rc = bi.path(&["idbi", "rc"])?;
    let reference = rc.text().map_or_else(
        || {
            let parts: Vec<Option<&XmlNode>> = ["pc1", "pc2", "car", "cc1", "cc2"]
                .iter()
                .map(|name| rc.child(name))
                .collect();
            joined_text(&parts)
        },
        String::from,
    );
    if reference.is_empty() {
        return None;
    }

    let address = bi.child_text("ldt").map(String::from).or_else(|| {
        let dir = bi.path(&["dt", "locs", "lous", "lourb", "dir"])?;
        let parts: Vec<&str> = ["tv", "nv", "pnp"]
            .iter()
            .filter_map(|name| dir.child_text(name))
            .collect();
        Some(parts.join(" ")).filter(|s| !s.is_empty())
    });

    let debi = bi.child("debi");
    let construction_year = bi
        .attr("ant")
        .or_else(|| debi.and_then(|d| d.child_text("ant")))
        .and_then(parse_year);

    Some(ParcelRecord {
        reference,
        address,
        usage: debi
            .and_then(|d| d.child_text("luso"))
            .map(String::from),
        floor_area_m2: debi
            .and_then(|d| d.child_text("sfc"))
            .and_then(parse_area)
            .unwrap_or(0.0),
        construction_year,
        coordinate: None,
    })
}

fn either_attr<'a>(
    first: Option<&'a XmlNode>,
    second: Option<&'a XmlNode>,
    name: &str,
) -> Option<&'a str> {
    first
        .and_then(|n| n.attr(name))
        .or_else(|| second.and_then(|n| n.attr(name)))
}

fn joined_text(nodes: &[Option<&XmlNode>]) -> String {
    nodes
        .iter()
        .filter_map(|n| n.and_then(XmlNode::text))
        .collect()
}

/// Positive integer year, anything else is unknown.
fn parse_year(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|y| *y > 0)
}

/// Finite non-negative surface, anything else is unknown.
fn parse_area(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE: Coordinate = Coordinate::new(28.1, -15.4);

    #[test]
    fn parses_parcel_with_attributes() {
        let body = r#"<consulta_coordenadas>
            <coordenadas><coord>
              <pc><pc1 rc="3662001TF6636A" use="Residencial" sfc="420.5" ant="1962"/><pc2/></pc>
              <geo><xcen>-15.4312</xcen><ycen>28.1067</ycen><srs>EPSG:4326</srs></geo>
              <ldt>CL PELOTA 12 LAS PALMAS</ldt>
            </coord></coordenadas>
          </consulta_coordenadas>"#;

        let parcel = parse_coordinate_response(body, PROBE).unwrap().unwrap();
        assert_eq!(parcel.reference, "3662001TF6636A");
        assert_eq!(parcel.address.as_deref(), Some("CL PELOTA 12 LAS PALMAS"));
        assert_eq!(parcel.usage.as_deref(), Some("Residencial"));
        assert!((parcel.floor_area_m2 - 420.5).abs() < 1e-9);
        assert_eq!(parcel.construction_year, Some(1962));
        let coordinate = parcel.coordinate.unwrap();
        assert!((coordinate.latitude - 28.1067).abs() < 1e-9);
        assert!((coordinate.longitude - -15.4312).abs() < 1e-9);
    }

    #[test]
    fn joins_reference_halves_from_text() {
        let body = "<consulta_coordenadas><coordenadas><coord>\
                    <pc><pc1>3662001</pc1><pc2>TF6636A</pc2></pc>\
                    <bi ant=\"1975\"/>\
                    </coord></coordenadas></consulta_coordenadas>";

        let parcel = parse_coordinate_response(body, PROBE).unwrap().unwrap();
        assert_eq!(parcel.reference, "3662001TF6636A");
        assert_eq!(parcel.construction_year, Some(1975));
        assert_eq!(parcel.coordinate, Some(PROBE));
        assert!(parcel.address.is_none());
        assert!(parcel.usage.is_none());
    }

    #[test]
    fn non_numeric_fields_degrade_to_unknown() {
        let body = r#"<consulta_coordenadas><coordenadas><coord>
              <pc><pc1 rc="X1" sfc="n/a" ant="unknown"/></pc>
              <geo><xcen>abc</xcen><ycen>28.0</ycen></geo>
            </coord></coordenadas></consulta_coordenadas>"#;

        let parcel = parse_coordinate_response(body, PROBE).unwrap().unwrap();
        assert!(parcel.floor_area_m2.abs() < f64::EPSILON);
        assert!(parcel.construction_year.is_none());
        assert_eq!(parcel.coordinate, Some(PROBE));
    }

    #[test]
    fn error_node_means_no_parcel() {
        let body = "<consulta_coordenadas>\
                    <control><cucoor>0</cucoor><cuerr>1</cuerr></control>\
                    <lerr><err><cod>11</cod><des>NO HAY NINGUNA PARCELA</des></err></lerr>\
                    </consulta_coordenadas>";
        assert!(parse_coordinate_response(body, PROBE).unwrap().is_none());

        let body = "<consulta_coordenadas><control><cuerr>2</cuerr></control>\
                    <coordenadas><coord><pc><pc1 rc=\"X\"/></pc></coord></coordenadas>\
                    </consulta_coordenadas>";
        assert!(parse_coordinate_response(body, PROBE).unwrap().is_none());
    }

    #[test]
    fn missing_parcel_node_means_no_parcel() {
        let body = "<consulta_coordenadas><coordenadas><coord><ldt>X</ldt></coord>\
                    </coordenadas></consulta_coordenadas>";
        assert!(parse_coordinate_response(body, PROBE).unwrap().is_none());

        let body = "<consulta_coordenadas><coordenadas><coord><pc><pc1/></pc></coord>\
                    </coordenadas></consulta_coordenadas>";
        assert!(parse_coordinate_response(body, PROBE).unwrap().is_none());
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(matches!(
            parse_coordinate_response("<html><body>Service Unavailable", PROBE),
            Err(CadastreError::Malformed { .. })
        ));
    }

    #[test]
    fn parses_reference_response() {
        let body = "<consulta_dnp><bico><bi>\
                    <idbi><rc><pc1>3662001</pc1><pc2>TF6636A</pc2><car>0001</car>\
                    <cc1>W</cc1><cc2>U</cc2></rc></idbi>\
                    <dt><locs><lous><lourb><dir><tv>CL</tv><nv>PELOTA</nv><pnp>12</pnp></dir>\
                    </lourb></lous></locs></dt>\
                    <debi><luso>Residencial</luso><sfc>96</sfc><ant>1958</ant></debi>\
                    </bi></bico></consulta_dnp>";

        let parcel = parse_reference_response(body).unwrap().unwrap();
        assert_eq!(parcel.reference, "3662001TF6636A0001WU");
        assert_eq!(parcel.address.as_deref(), Some("CL PELOTA 12"));
        assert_eq!(parcel.usage.as_deref(), Some("Residencial"));
        assert_eq!(parcel.construction_year, Some(1958));
        assert!((parcel.floor_area_m2 - 96.0).abs() < 1e-9);
        assert!(parcel.coordinate.is_none());
    }

    #[test]
    fn reference_error_means_no_parcel() {
        let body = "<consulta_dnp><lerr><err><cod>1</cod></err></lerr></consulta_dnp>";
        assert!(parse_reference_response(body).unwrap().is_none());
    }
}

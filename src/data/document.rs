//! Market document parsing.
//!
//! Upstream documents look like this (namespaces and unrelated elements elided):
//!
//! ```text
//! <Publication_MarketDocument>
//!   <TimeSeries>
//!     <MktPSRType><psrType>B16</psrType></MktPSRType>      (generation only)
//!     <Period>
//!       <timeInterval><start>2024-01-01T23:00Z</start>...</timeInterval>
//!       <resolution>PT15M</resolution>
//!       <Point><position>1</position><quantity>1234</quantity></Point>
//!       <Point><position>2</position><price.amount>81.3</price.amount></Point>
//!     </Period>
//!   </TimeSeries>
//! </Publication_MarketDocument>
//! ```
//!
//! The document is streamed with `quick-xml` into a raw tree of strings, then
//! normalized into [`MarketData`]:
//!
//! - price/load kinds flatten every time-series/period/point into one series, in
//!   document order (typically chronological, not guaranteed; no sorting here)
//! - generation groups points by the PSR code of their time-series block
//! - points whose value does not parse to a finite number are dropped

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;

use crate::data::psr;
use crate::domain::{MarketData, MetricKind, MultiSeries, POWER_UNIT, Point, Series};
use crate::error::{PipelineError, Result};
use crate::series::clock::{ResolutionClock, parse_utc_instant};

const ACKNOWLEDGEMENT_ROOT: &str = "Acknowledgement_MarketDocument";
const UNSPECIFIED_CATEGORY: &str = "Unspecified";

#[derive(Debug, Default)]
struct RawDocument {
    root: String,
    reasons: Vec<String>,
    time_series: Vec<RawTimeSeries>,
}

#[derive(Debug, Default)]
struct RawTimeSeries {
    psr_type: Option<String>,
    periods: Vec<RawPeriod>,
}

#[derive(Debug, Default)]
struct RawPeriod {
    start: Option<String>,
    resolution: Option<String>,
    points: Vec<RawPoint>,
}

#[derive(Debug, Default)]
struct RawPoint {
    position: Option<String>,
    quantity: Option<String>,
    price: Option<String>,
}

impl RawPoint {
    fn value_for(&self, metric: MetricKind) -> Option<&str> {
        if metric.is_price() {
            self.price.as_deref()
        } else {
            self.quantity.as_deref()
        }
    }
}

/// Turns market documents into series, resolving timestamps with a [`ResolutionClock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentParser {
    clock: ResolutionClock,
}

impl DocumentParser {
    pub fn new(clock: ResolutionClock) -> Self {
        Self { clock }
    }

    pub fn parse_bytes(&self, raw: &[u8], metric: MetricKind) -> Result<MarketData> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| PipelineError::DocumentParse(format!("document is not UTF-8: {e}")))?;
        self.parse(text, metric)
    }

    pub fn parse(&self, raw: &str, metric: MetricKind) -> Result<MarketData> {
        let doc = read_document(raw)?;
        if doc.root == ACKNOWLEDGEMENT_ROOT {
            let reason = if doc.reasons.is_empty() {
                "no reason given".to_string()
            } else {
                doc.reasons.join("; ")
            };
            return Err(PipelineError::DocumentParse(format!(
                "upstream returned an acknowledgement instead of data: {reason}"
            )));
        }

        let mut dropped = 0usize;
        let data = if metric.is_categorized() {
            let mut multi = MultiSeries::new(POWER_UNIT);
            for ts in &doc.time_series {
                let category = match ts.psr_type.as_deref() {
                    Some(code) if !code.trim().is_empty() => psr::translate(code),
                    _ => UNSPECIFIED_CATEGORY.to_string(),
                };
                let series = multi.category_mut(&category);
                dropped += self.collect_points(ts, metric, series)?;
            }
            MarketData::Categorized(multi)
        } else {
            let mut series = Series::new(metric.display_name(), metric.unit());
            for ts in &doc.time_series {
                dropped += self.collect_points(ts, metric, &mut series)?;
            }
            MarketData::Single(series)
        };

        debug!(
            "Parsed {} document <{}>: {} time series, {} points, {} dropped",
            metric.key(),
            doc.root,
            doc.time_series.len(),
            data.point_count(),
            dropped
        );
        Ok(data)
    }

    /// Append every valid point of `ts` to `out`; returns how many were dropped.
    fn collect_points(&self, ts: &RawTimeSeries, metric: MetricKind, out: &mut Series) -> Result<usize> {
        let mut dropped = 0;
        for period in &ts.periods {
            if period.points.is_empty() {
                continue;
            }
            let start = period
                .start
                .as_deref()
                .ok_or_else(|| PipelineError::DocumentParse("period without a start instant".to_string()))
                .and_then(parse_utc_instant)?;
            let resolution = period.resolution.as_deref().unwrap_or_default();

            for point in &period.points {
                let (Some(position), Some(value)) = (
                    point.position.as_deref().and_then(parse_position),
                    point.value_for(metric).and_then(parse_value),
                ) else {
                    dropped += 1;
                    continue;
                };
                let timestamp = self.clock.resolve(start, resolution, position)?;
                out.points.push(Point::new(timestamp, value));
            }
        }
        Ok(dropped)
    }
}

/// Parse with the default 60-minute resolution fallback.
pub fn parse(raw: &str, metric: MetricKind) -> Result<MarketData> {
    DocumentParser::default().parse(raw, metric)
}

/// Reason text of an acknowledgement (error) document, if `raw` is one.
pub fn acknowledgement_reason(raw: &str) -> Option<String> {
    let doc = read_document(raw).ok()?;
    (doc.root == ACKNOWLEDGEMENT_ROOT && !doc.reasons.is_empty()).then(|| doc.reasons.join("; "))
}

fn parse_value(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

fn parse_position(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn read_document(raw: &str) -> Result<RawDocument> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);

    let mut doc = RawDocument::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                open_element(&mut doc, &path, &name)?;
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                open_element(&mut doc, &path, &name)?;
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| {
                    PipelineError::DocumentParse(format!(
                        "bad text at byte {}: {e}",
                        reader.buffer_position()
                    ))
                })?;
                element_text(&mut doc, &path, text.trim())?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(PipelineError::DocumentParse(format!(
                    "malformed markup at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    if doc.root.is_empty() {
        return Err(PipelineError::DocumentParse("empty document".to_string()));
    }
    if let Some(open) = path.last() {
        return Err(PipelineError::DocumentParse(format!(
            "truncated document: <{open}> is never closed"
        )));
    }
    Ok(doc)
}

fn open_element(doc: &mut RawDocument, path: &[String], name: &str) -> Result<()> {
    let Some(parent) = path.last() else {
        if !doc.root.is_empty() {
            return Err(PipelineError::DocumentParse(format!(
                "unexpected second root element <{name}>"
            )));
        }
        if !name.ends_with("MarketDocument") {
            return Err(PipelineError::DocumentParse(format!(
                "unexpected root element <{name}>, expected a market document"
            )));
        }
        doc.root = name.to_string();
        return Ok(());
    };

    match (parent.as_str(), name) {
        (_, "TimeSeries") if path.len() == 1 => doc.time_series.push(RawTimeSeries::default()),
        ("TimeSeries", "Period") => {
            if let Some(ts) = doc.time_series.last_mut() {
                ts.periods.push(RawPeriod::default());
            }
        }
        ("Period", "Point") => {
            if let Some(period) = current_period(doc) {
                period.points.push(RawPoint::default());
            }
        }
        _ => {}
    }
    Ok(())
}

fn element_text(doc: &mut RawDocument, path: &[String], text: &str) -> Result<()> {
    let n = path.len();
    if n == 0 {
        if text.is_empty() {
            return Ok(());
        }
        return Err(PipelineError::DocumentParse(format!(
            "unexpected text outside the root element: '{}'",
            text.chars().take(60).collect::<String>()
        )));
    }

    let current = path[n - 1].as_str();
    let parent = if n >= 2 { path[n - 2].as_str() } else { "" };
    let grandparent = if n >= 3 { path[n - 3].as_str() } else { "" };
    let text = Some(text.to_string());

    match (grandparent, parent, current) {
        (_, "MktPSRType", "psrType") => {
            if let Some(ts) = doc.time_series.last_mut() {
                ts.psr_type = text;
            }
        }
        ("Period", "timeInterval", "start") => {
            if let Some(period) = current_period(doc) {
                period.start = text;
            }
        }
        (_, "Period", "resolution") => {
            if let Some(period) = current_period(doc) {
                period.resolution = text;
            }
        }
        (_, "Point", "position") => {
            if let Some(point) = current_point(doc) {
                point.position = text;
            }
        }
        (_, "Point", "quantity") => {
            if let Some(point) = current_point(doc) {
                point.quantity = text;
            }
        }
        (_, "Point", "price.amount") => {
            if let Some(point) = current_point(doc) {
                point.price = text;
            }
        }
        (_, "Reason", "text") => {
            if let Some(reason) = text {
                doc.reasons.push(reason);
            }
        }
        _ => {}
    }
    Ok(())
}

fn current_period(doc: &mut RawDocument) -> Option<&mut RawPeriod> {
    doc.time_series.last_mut()?.periods.last_mut()
}

fn current_point(doc: &mut RawDocument) -> Option<&mut RawPoint> {
    current_period(doc)?.points.last_mut()
}

/// Builders for synthetic market documents used across the test suite.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::fmt::Write;

    /// One time-series block: optional PSR code, period start, resolution, values by position.
    pub struct Block<'a> {
        pub psr_type: Option<&'a str>,
        pub start: &'a str,
        pub resolution: &'a str,
        pub values: Vec<String>,
    }

    pub fn block<'a>(start: &'a str, resolution: &'a str, values: &[f64]) -> Block<'a> {
        Block {
            psr_type: None,
            start,
            resolution,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn document(root: &str, value_tag: &str, blocks: &[Block<'_>]) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            out,
            "<{root} xmlns=\"urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:3\">"
        );
        out.push_str("  <mRID>doc-1</mRID>\n");
        for (i, b) in blocks.iter().enumerate() {
            out.push_str("  <TimeSeries>\n");
            let _ = writeln!(out, "    <mRID>{}</mRID>", i + 1);
            if let Some(psr) = b.psr_type {
                let _ = writeln!(out, "    <MktPSRType><psrType>{psr}</psrType></MktPSRType>");
            }
            out.push_str("    <Period>\n");
            let _ = writeln!(
                out,
                "      <timeInterval><start>{}</start><end>ignored</end></timeInterval>",
                b.start
            );
            let _ = writeln!(out, "      <resolution>{}</resolution>", b.resolution);
            for (pos, v) in b.values.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "      <Point><position>{}</position><{value_tag}>{v}</{value_tag}></Point>",
                    pos + 1
                );
            }
            out.push_str("    </Period>\n  </TimeSeries>\n");
        }
        let _ = writeln!(out, "</{root}>");
        out
    }

    pub fn load_document(start: &str, resolution: &str, values: &[f64]) -> String {
        document("GL_MarketDocument", "quantity", &[block(start, resolution, values)])
    }

    pub fn price_document(start: &str, resolution: &str, values: &[f64]) -> String {
        document(
            "Publication_MarketDocument",
            "price.amount",
            &[block(start, resolution, values)],
        )
    }

    pub fn acknowledgement(reason: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Acknowledgement_MarketDocument xmlns=\"urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:7:0\">\
             <mRID>ack</mRID><Reason><code>999</code><text>{reason}</text></Reason>\
             </Acknowledgement_MarketDocument>"
        )
    }
}

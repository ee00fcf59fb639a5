use crate::catalog::element_set_identifier;
use crate::parser::Observer;
use crate::response::map_url::MapUrl;
use crate::track::{PropagationPort, TrackAdapter, TrackError};

/// Context shown on the map before the focal time, and after the last
/// plotted marker.
const TRACE_MARGIN_SECONDS: i64 = 4 * 60;

/// Everything needed to answer one matched message.
#[derive(Debug, Clone)]
pub struct ResponseContext<'a> {
    pub satellite: &'a str,
    pub elements: &'a str,
    pub author: &'a str,
    pub message_id: u64,
    /// Focal time: the message time or its explicit `#time`.
    pub mention_time: i64,
    /// When the reply is being made.
    pub response_time: i64,
    pub explicit_time: bool,
    pub observer: Option<&'a Observer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub map_url: String,
    pub text: String,
}

/// Start and end of the plotted ground track.
///
/// The track always starts four minutes before the focal time. It runs on to
/// four minutes past the response time when a live marker is plotted, and
/// past the focal time otherwise.
pub fn trace_window(mention_time: i64, response_time: i64, explicit_time: bool) -> (i64, i64) {
    let last_marker = if explicit_time {
        mention_time
    } else {
        response_time
    };
    (
        mention_time.saturating_sub(TRACE_MARGIN_SECONDS),
        last_marker.saturating_add(TRACE_MARGIN_SECONDS),
    )
}

pub struct ResponseAssembler<P> {
    adapter: TrackAdapter<P>,
    base_url: String,
}

impl<P: PropagationPort> ResponseAssembler<P> {
    pub fn new(adapter: TrackAdapter<P>, base_url: impl Into<String>) -> Self {
        Self {
            adapter,
            base_url: base_url.into(),
        }
    }

    pub fn assemble(&self, ctx: &ResponseContext<'_>) -> Result<Response, TrackError> {
        let mut url = MapUrl::new(&self.base_url);
        url.text("sn", ctx.satellite)
            .text("un", ctx.author)
            .raw("ut", ctx.message_id)
            .text("si", &element_set_identifier(ctx.elements));

        let (trace_start, trace_end) =
            trace_window(ctx.mention_time, ctx.response_time, ctx.explicit_time);
        url.raw("t1", trace_start).raw("t2", trace_end);
        for point in self.adapter.trace(ctx.elements, trace_start, trace_end)? {
            url.coords("ll", point.latitude, point.longitude);
        }

        if let Some(observer) = ctx.observer {
            url.coords("ol", observer.latitude, observer.longitude)
                .text("on", &observer.name);
        }

        let mention = self
            .adapter
            .point(ctx.elements, ctx.mention_time, ctx.observer)?;
        url.fix('m', &mention, ctx.mention_time);

        // An explicit time is the reference the caller asked about; no live
        // marker is plotted alongside it.
        if !ctx.explicit_time {
            let response = self
                .adapter
                .point(ctx.elements, ctx.response_time, ctx.observer)?;
            url.fix('r', &response, ctx.response_time);
        }

        let map_url = url.build();
        let text = reply_text(ctx.satellite, mention.latitude, mention.longitude, &map_url);
        Ok(Response { map_url, text })
    }
}

fn reply_text(satellite: &str, latitude: f64, longitude: f64, map_url: &str) -> String {
    format!(
        "When you mentioned {}, it was above {:.4}{} {:.4}{}. Here's more info: {}",
        satellite,
        latitude.abs(),
        if latitude >= 0.0 { "N" } else { "S" },
        longitude.abs(),
        if longitude >= 0.0 { "E" } else { "W" },
        map_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::canned::CannedPropagator;
    use crate::track::TimeSpec;
    use std::time::Duration;

    const ELEMENTS: &str = "1 25544U 98067A   12110.89270833  .00016717  00000-0  10270-3 0  9005\n2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    fn assembler() -> ResponseAssembler<CannedPropagator> {
        let port = CannedPropagator::new(
            "0,51.0000,-1.0000\n1,51.2000,-0.6000\n2,51.4000,-0.2000\n",
            [51.5, -0.1, 420.0, 7.6, 90.0, 1.0, 20.0, 180.0, -10.0],
        );
        ResponseAssembler::new(
            TrackAdapter::new(port, Duration::from_secs(60)),
            "http://wheresthatsat.com/map.html",
        )
    }

    fn context(explicit_time: bool) -> ResponseContext<'static> {
        ResponseContext {
            satellite: "ISS",
            elements: ELEMENTS,
            author: "anoved",
            message_id: 192628510526013440,
            mention_time: 1334872442,
            response_time: 1334873042,
            explicit_time,
            observer: None,
        }
    }

    #[test]
    fn trace_window_depends_on_explicit_time() {
        assert_eq!(trace_window(1000, 1300, false), (760, 1540));
        assert_eq!(trace_window(1000, 1300, true), (760, 1240));
        assert_eq!(trace_window(i64::MAX, 0, true), (i64::MAX - 240, i64::MAX));
        assert_eq!(trace_window(i64::MIN, 0, false), (i64::MIN, 240));
    }

    #[test]
    fn reply_for_implicit_time_without_observer() {
        let assembler = assembler();
        let response = assembler.assemble(&context(false)).unwrap();

        assert!(response
            .text
            .starts_with("When you mentioned ISS, it was above 51.5000N 0.1000W."));
        assert!(response.text.ends_with(&response.map_url));

        let url = &response.map_url;
        assert!(url.starts_with(
            "http://wheresthatsat.com/map.html?sn=ISS&un=anoved&ut=192628510526013440&si=25544"
        ));
        assert!(url.contains("&t1=1334872202&t2=1334873282"));
        assert_eq!(url.matches("&ll=").count(), 3);
        assert!(url.contains("&ml=51.5000,-0.1000&ma=420.00&ms=7.60&mh=90.00&mt=1334872442"));
        assert!(url.contains("&rl=51.5000,-0.1000&ra=420.00&rs=7.60&rh=90.00&rt=1334873042"));
        assert!(!url.contains("&ol=") && !url.contains("&mi=") && !url.contains("&ri="));

        let queries = assembler.adapter_queries();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[2].time, TimeSpec::Point { at: 1334873042 });
    }

    #[test]
    fn explicit_time_suppresses_response_point() {
        let assembler = assembler();
        let response = assembler.assemble(&context(true)).unwrap();

        let url = &response.map_url;
        assert!(url.contains("&t1=1334872202&t2=1334872682"));
        for key in ["&rl=", "&ra=", "&rs=", "&rh=", "&rt=", "&ri="] {
            assert!(!url.contains(key), "unexpected {key} in {url}");
        }
        assert!(response.text.contains("above 51.5000N 0.1000W."));
        assert_eq!(assembler.adapter_queries().len(), 2);
    }

    #[test]
    fn observer_adds_location_and_visibility() {
        let observer = Observer {
            latitude: 38.130236,
            longitude: 15.375366,
            name: "\"Messina\"".to_string(),
        };
        let mut ctx = context(false);
        ctx.observer = Some(&observer);

        let response = assembler().assemble(&ctx).unwrap();
        let url = &response.map_url;
        assert!(url.contains("&ol=38.1302,15.3754&on=%22Messina%22&ml="));
        assert!(url.contains("&mt=1334872442&mi=1&me=20.00&mz=180.00&mo=-10.00"));
        assert!(url.contains("&rt=1334873042&ri=1&re=20.00&rz=180.00&ro=-10.00"));
    }

    #[test]
    fn southern_western_hemispheres() {
        assert_eq!(
            reply_text("HST", -12.34567, -0.5, "u"),
            "When you mentioned HST, it was above 12.3457S 0.5000W. Here's more info: u"
        );
        assert!(reply_text("HST", 0.0, 0.0, "u").contains("0.0000N 0.0000E"));
    }

    #[test]
    fn propagator_failure_aborts_response() {
        let port = CannedPropagator::new("0,1,2\n", [0.0; 9]).failing_points();
        let assembler = ResponseAssembler::new(
            TrackAdapter::new(port, Duration::from_secs(60)),
            "map.html",
        );
        assert!(matches!(
            assembler.assemble(&context(false)),
            Err(TrackError::EmptyOutput)
        ));
    }

    impl ResponseAssembler<CannedPropagator> {
        pub(crate) fn adapter_queries(&self) -> Vec<crate::track::canned::RecordedQuery> {
            self.adapter.port().queries()
        }
    }
}

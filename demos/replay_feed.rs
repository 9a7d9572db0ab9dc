//! Replay a small recorded capture and print the canonical feed

fn main() {
    let capture = r#"{"notice":"before_navigate","tabId":7,"url":"https://example.com/","frameId":0,"timeStamp":1000.25}
{"notice":"dom_content_loaded","tabId":7,"frameId":0,"timeStamp":1200.5}
{"notice":"completed","tabId":7,"frameId":0,"timeStamp":1500.9}
{"notice":"before_navigate","tabId":7,"url":"https://example.com/ad","frameId":3,"timeStamp":1600.0}
{"notice":"tab_replaced","addedTabId":12,"removedTabId":7}
{"notice":"tab_removed","tabId":12}"#;

    match tabfeed::replay_ndjson(capture) {
        Ok(events) => {
            for event in &events {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("Error: {e:?}"),
                }
            }
        }
        Err(e) => eprintln!("Error: {e:?}"),
    }
}

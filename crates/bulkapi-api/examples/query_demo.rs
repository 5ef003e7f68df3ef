/// Query Demo
///
/// Runs the client against a canned in-process transport: looks up a model,
/// builds the same filter three ways, runs a paged query and prints the
/// resulting table.
use bulkapi::logging::LogConfig;
use bulkapi::{
    compile, Client, ClientConfig, FieldSpec, FilterNode, HttpRequest, HttpResponse, Method,
    QueryOptions, Transport, Q,
};
use serde_json::{json, Value};

/// Answers every request from a fixed set of documents
struct CannedApi;

impl Transport for CannedApi {
    fn send(&self, request: &HttpRequest) -> bulkapi::Result<HttpResponse> {
        let body = match (request.method, request.url.as_str()) {
            (Method::Get, "http://localhost:8000/bulk/api/") => {
                json!({"pivotpoll": "http://localhost:8000/bulk/api/pivotpoll/"})
            }
            (Method::Get, "http://localhost:8000/bulk/api/pivotpoll/") => {
                json!({"question": "/bulk/api/pivotpoll/question/"})
            }
            (Method::Post, "http://localhost:8000/bulk/api/pivotpoll/question/query") => {
                let page = request
                    .json_body()?
                    .and_then(|b| b.get("page").and_then(Value::as_u64))
                    .unwrap_or(1);
                if page == 1 {
                    json!({
                        "count": 3,
                        "next": "http://localhost:8000/bulk/api/pivotpoll/question/query?page=2",
                        "previous": null,
                        "results": [
                            {"id": 1, "question": "Who won?", "integer": 4},
                            {"id": 2, "question": "What time is it?", "integer": 1}
                        ]
                    })
                } else {
                    json!({
                        "count": 3,
                        "next": null,
                        "previous": "http://localhost:8000/bulk/api/pivotpoll/question/query?page=1",
                        "results": [{"id": 3, "question": "Who knows?"}]
                    })
                }
            }
            _ => return Ok(HttpResponse::new(404, "{\"detail\": \"Not found.\"}")),
        };
        Ok(HttpResponse::json(200, &body))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = LogConfig::info().init();

    println!("=== Bulk API Query Demo ===\n");

    // Three ways to write one filter
    let from_mapping = FilterNode::from_mapping(&json!({
        "or": [
            {"question__startswith": "Who"},
            {"question__startswith": "What", "integer__gte": 1}
        ]
    }))?;
    let from_builder = Q::lookup("question__startswith", "Who")?
        | (Q::lookup("question__startswith", "What")? & Q::lookup("integer__gte", 1)?);
    let from_text = FilterNode::from_text(
        "or:\n  - question__startswith: Who\n  - question__startswith: What\n    integer__gte: 1\n",
    )?;

    println!("Filter:  {}", from_builder);
    println!("Mapping form equals builder form: {}", from_mapping == from_builder);
    println!("Text form equals builder form:    {}\n", from_text == from_builder);

    let options = QueryOptions::new()
        .with_filter(from_builder)
        .with_fields(FieldSpec::from_value(&json!(["id", {"question": "text"}, "integer"]))?)
        .with_order(["id"])
        .with_page_size(2);
    println!("Wire parameters: {}\n", compile(&options)?);

    let config = ClientConfig::new("demo-token").with_api_url("http://localhost:8000/bulk/api/");
    let client = Client::new(config, CannedApi)?;
    let questions = client.app("pivotpoll")?.model("Question")?;
    println!("{}", questions);

    let table = questions.query(&options)?;
    println!("{}", table.columns().join(" | "));
    for row in table.rows() {
        let cells: Vec<String> = row.values().iter().map(Value::to_string).collect();
        println!("{}", cells.join(" | "));
    }

    println!("\nRows: {}", table.len());
    Ok(())
}

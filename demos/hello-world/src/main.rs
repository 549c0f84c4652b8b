//! Minimal Crossbar server: a route tree with a nested handler chain,
//! served over the hyper transport.
//!
//! ```bash
//! cargo run --bin hello-world
//! curl localhost:3000/hello
//! curl localhost:3000/hello/world
//! curl localhost:3000/greet/you
//! ```

use crossbar::core::telemetry;
use crossbar::prelude::*;
use serde_json::json;

fn routes() -> Vec<Route> {
    vec![
        Route::new(Method::Get, "/hello")
            .handler_fn(|_req, mut res| async move {
                res.set_status(200);
                res.set_body(json!(["Hello"]));
                Ok(Flow::Continue(res))
            })
            .child(
                Route::nested("/world")
                    .handler_fn(|_req, mut res| async move {
                        res.set_body(json!(["Hello"]));
                        Ok(Flow::Continue(res))
                    })
                    .handler_fn(|_req, mut res| async move {
                        if let Some(items) = res.body_mut().as_array_mut() {
                            items.push(json!("World"));
                        }
                        res.set_status(200);
                        Ok(Flow::Continue(res))
                    }),
            ),
        Route::new(Method::Get, "/greet/:name").handler_fn(|req, mut res| async move {
            let name = req.param("name").unwrap_or_default();
            res.set_body(json!({ "greeting": format!("Hello, {name}!") }));
            Ok(Flow::Continue(res))
        }),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = ServerConfig {
        https: false,
        host: Some("127.0.0.1".to_string()),
        port: Some(3000),
    };

    let mut server = Server::new(HyperAdapter::new(), routes());
    server.connect(&config).await?;
    println!("listening on http://127.0.0.1:3000 (ctrl-c to stop)");

    tokio::signal::ctrl_c().await?;
    server.disconnect().await?;
    Ok(())
}

//! BDD step definitions for the builder and lifecycle feature

use std::sync::Arc;

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use alert_feed::io::HttpClient;
use alert_feed::{AlertFeedBuilder, Config};

use crate::world::AlertFeedWorld;

fn builder(world: &mut AlertFeedWorld, cancel: Option<CancellationToken>) -> AlertFeedBuilder {
    let mut config = Config::default();
    config.dashboard.enabled = false;
    if let Some(base_url) = &world.base_url {
        config.feed.base_url = base_url.clone();
    }

    let http: Arc<dyn HttpClient> = world.http.clone();
    let mut builder = AlertFeedBuilder::new(config).with_http_client(http);
    if let Some(cancel) = cancel {
        builder = builder.with_cancellation_token(cancel);
    }
    builder
}

#[given("a default configuration")]
fn default_configuration(world: &mut AlertFeedWorld) {
    world.base_url = None;
}

#[given(expr = "a configuration with base URL {string}")]
fn configuration_with_base_url(world: &mut AlertFeedWorld, base_url: String) {
    world.base_url = Some(base_url);
}

#[given("a pre-cancelled cancellation token")]
fn pre_cancelled_token(world: &mut AlertFeedWorld) {
    world.cancelled = true;
}

#[when("the alert feed is built")]
fn alert_feed_is_built(world: &mut AlertFeedWorld) {
    let builder = builder(world, None);
    world.build_succeeded = Some(builder.build().is_ok());
}

#[when("the alert feed is built and started")]
async fn alert_feed_is_built_and_started(world: &mut AlertFeedWorld) {
    let cancel = CancellationToken::new();
    if world.cancelled {
        cancel.cancel();
    }
    let builder = builder(world, Some(cancel));
    match builder.build() {
        Ok(feed) => {
            world.build_succeeded = Some(true);
            world.start_succeeded = Some(feed.start().await.is_ok());
        }
        Err(_) => {
            world.build_succeeded = Some(false);
            world.start_succeeded = Some(false);
        }
    }
}

#[then("the build should succeed")]
fn build_should_succeed(world: &mut AlertFeedWorld) {
    assert_eq!(world.build_succeeded, Some(true), "Expected build to succeed");
}

#[then("the build should fail")]
fn build_should_fail(world: &mut AlertFeedWorld) {
    assert_eq!(world.build_succeeded, Some(false), "Expected build to fail");
}

#[then("the lifecycle should complete successfully")]
fn lifecycle_should_complete(world: &mut AlertFeedWorld) {
    assert_eq!(world.build_succeeded, Some(true), "Expected build to succeed");
    assert_eq!(world.start_succeeded, Some(true), "Expected start to succeed");
}

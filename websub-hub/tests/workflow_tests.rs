//! End-to-end tests of the hub workflows against a mock adaptor and a live
//! subscriber stub.


use std::sync::Arc;

use mock_adaptor::{HookCall, MockAdaptor};
use test_helpers::{
    encode, form_request, recv_within, test_hub, CallbackBehavior, SubscriberStub, EXPECT_WITHIN,
    QUIET_PERIOD,
};
use websub_hub::http::header::{HeaderName, LOCATION};
use websub_hub::http::StatusCode;
use websub_hub::params::{
    APPLICATION_JSON, HUB_CALLBACK, HUB_CHALLENGE, HUB_LEASE_SECONDS, HUB_MODE, HUB_REASON,
    HUB_TOPIC, PUBLISHER_HEADER, PUBLISHER_PUBLISH,
};
use websub_hub::{
    Concurrency, Hook, HookError, HookSet, HubRequest, HubResponse, ParameterMap, Redirect,
    Subscription, SubscriptionAck, UpdateKind, DEFAULT_LEASE_SECONDS, INVALID_MODE_MESSAGE,
};

fn subscribe_pairs<'a>(callback: &'a str, lease: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        (HUB_MODE, "subscribe"),
        (HUB_TOPIC, "news"),
        (HUB_CALLBACK, callback),
        (HUB_LEASE_SECONDS, lease),
    ]
}

fn expected_subscription(pairs: &[(&str, &str)]) -> Subscription {
    let params: ParameterMap = pairs.iter().copied().collect();
    Subscription::from_params(test_helpers::HUB_URL, DEFAULT_LEASE_SECONDS, &params).unwrap()
}

#[tokio::test]
async fn test_register_topic_returns_hook_response() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::none());
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub
        .handle(form_request(&[(HUB_MODE, "register"), (HUB_TOPIC, "news")]))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "registered");

    let calls = adaptor.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        HookCall::Register(message) => {
            assert_eq!(message.topic(), "news");
            assert_eq!(message.hub(), test_helpers::HUB_URL);
        }
        other => panic!("Unexpected hook call: {:?}", other),
    }
}

#[tokio::test]
async fn test_repeated_registration_calls_hook_each_time() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::none());
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    for _ in 0..2 {
        let response = hub
            .handle(form_request(&[(HUB_MODE, "register"), (HUB_TOPIC, "news")]))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(adaptor.count(|call| matches!(call, HookCall::Register(_))), 2);
}

#[tokio::test]
async fn test_register_hook_error_becomes_bad_request() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::none());
    let adaptor =
        Arc::new(adaptor.with_register_reply(Err(HookError::new("Topic news is already taken"))));
    let hub = test_hub(adaptor);

    let response = hub
        .handle(form_request(&[(HUB_MODE, "register"), (HUB_TOPIC, "news")]))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Topic news is already taken");
}

#[tokio::test]
async fn test_deregister_without_topic_is_rejected_before_hook() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::none());
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub.handle(form_request(&[(HUB_MODE, "deregister")])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Empty value found for parameter 'hub.topic'");
    assert!(adaptor.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_mode_is_rejected() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::all());
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    for request in [
        form_request(&[(HUB_MODE, "explode"), (HUB_TOPIC, "news")]),
        form_request(&[(HUB_TOPIC, "news")]),
        form_request(&[(HUB_MODE, "Subscribe"), (HUB_TOPIC, "news")]),
    ] {
        let response = hub.handle(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), INVALID_MODE_MESSAGE);
    }
    assert!(adaptor.calls().is_empty());
}

#[tokio::test]
async fn test_unsupported_content_type_is_rejected() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::none());
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let request = HubRequest::default()
        .with_content_type("text/html")
        .with_query(encode(&[(HUB_MODE, "publish"), (HUB_TOPIC, "news")]))
        .with_body("<p>hi</p>");
    let response = hub.handle(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().contains("text/html"));
    assert!(response.text().contains(APPLICATION_JSON));
    assert!(adaptor.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_publisher_header_is_rejected() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::none());
    let hub = test_hub(Arc::new(adaptor));

    let request = form_request(&[(HUB_MODE, "publish"), (HUB_TOPIC, "news")])
        .with_header(HeaderName::from_static(PUBLISHER_HEADER), "shout");
    let response = hub.handle(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text(),
        "Invalid value `shout` found for header `x-websub-publisher`"
    );
}

#[tokio::test]
async fn test_accepted_subscription_is_verified_once() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();
    let pairs = subscribe_pairs(&callback, "3600");

    let hooks = HookSet::none()
        .with(Hook::Subscription)
        .with(Hook::SubscriptionIntentVerified);
    let (adaptor, mut events) = MockAdaptor::new(hooks);
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub.handle(form_request(&pairs)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let challenge = subscriber.next_request().await.expect("challenge not received");
    assert_eq!(challenge.get(HUB_MODE).map(String::as_str), Some("subscribe"));
    assert_eq!(challenge.get(HUB_TOPIC).map(String::as_str), Some("news"));
    assert_eq!(challenge.get(HUB_LEASE_SECONDS).map(String::as_str), Some("3600"));
    assert!(!challenge.get(HUB_CHALLENGE).unwrap().is_empty());

    let expected = expected_subscription(&pairs);
    assert_eq!(
        recv_within(&mut events, EXPECT_WITHIN).await,
        Some(HookCall::Subscription(expected.clone()))
    );
    assert_eq!(
        recv_within(&mut events, EXPECT_WITHIN).await,
        Some(HookCall::SubscriptionIntentVerified(expected))
    );

    assert!(recv_within(&mut events, QUIET_PERIOD).await.is_none());
    assert_eq!(
        adaptor.count(|call| matches!(call, HookCall::SubscriptionIntentVerified(_))),
        1
    );
}

#[tokio::test]
async fn test_subscription_without_hook_is_accepted_and_verified() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();
    let pairs = subscribe_pairs(&callback, "600");

    let (adaptor, mut events) =
        MockAdaptor::new(HookSet::none().with(Hook::SubscriptionIntentVerified));
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub.handle(form_request(&pairs)).await;
    assert_eq!(response, HubResponse::accepted());

    assert!(subscriber.next_request().await.is_some());
    assert_eq!(
        recv_within(&mut events, EXPECT_WITHIN).await,
        Some(HookCall::SubscriptionIntentVerified(expected_subscription(&pairs)))
    );
    assert_eq!(adaptor.count(|call| matches!(call, HookCall::Subscription(_))), 0);
}

#[tokio::test]
async fn test_failed_challenge_never_confirms() {
    for behavior in [CallbackBehavior::Status(404), CallbackBehavior::WrongChallenge] {
        let mut subscriber = SubscriberStub::start(behavior).await;
        let callback = subscriber.callback_url();

        let (adaptor, _events) =
            MockAdaptor::new(HookSet::none().with(Hook::SubscriptionIntentVerified));
        let adaptor = Arc::new(adaptor);
        let hub = test_hub(Arc::clone(&adaptor));

        let response = hub.handle(form_request(&subscribe_pairs(&callback, "3600"))).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        assert!(subscriber.next_request().await.is_some());
        tokio::time::sleep(QUIET_PERIOD).await;
        assert!(adaptor.calls().is_empty(), "{:?} confirmed the subscription", behavior);
    }
}

#[tokio::test]
async fn test_redirected_subscription_skips_verification() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let redirect = Redirect::temporary("https://other-hub.example.com/hub").unwrap();
    let hooks = HookSet::none()
        .with(Hook::Subscription)
        .with(Hook::SubscriptionIntentVerified);
    let (adaptor, _events) = MockAdaptor::new(hooks);
    let adaptor = Arc::new(adaptor.with_subscription_reply(Ok(SubscriptionAck::Redirect(redirect))));
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub.handle(form_request(&subscribe_pairs(&callback, "3600"))).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://other-hub.example.com/hub"
    );
    assert!(subscriber.stays_silent().await);
    assert_eq!(adaptor.calls().len(), 1);
}

#[tokio::test]
async fn test_non_accepted_subscription_response_skips_verification() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let (adaptor, _events) = MockAdaptor::new(HookSet::none().with(Hook::Subscription));
    let adaptor = Arc::new(
        adaptor.with_subscription_reply(Ok(HubResponse::ok().with_text("noted").into())),
    );
    let hub = test_hub(adaptor);

    let response = hub.handle(form_request(&subscribe_pairs(&callback, "3600"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "noted");
    assert!(subscriber.stays_silent().await);
}

#[tokio::test]
async fn test_subscription_hook_error_is_bad_request() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let (adaptor, _events) = MockAdaptor::new(HookSet::none().with(Hook::Subscription));
    let adaptor = Arc::new(adaptor.with_subscription_reply(Err(HookError::new("Unknown topic"))));
    let hub = test_hub(adaptor);

    let response = hub.handle(form_request(&subscribe_pairs(&callback, "3600"))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Unknown topic");
    assert!(subscriber.stays_silent().await);
}

#[tokio::test]
async fn test_subscription_with_bad_callback_is_rejected() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::all());
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub
        .handle(form_request(&subscribe_pairs("ftp://subscriber/cb", "3600")))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().contains(HUB_CALLBACK));
    assert!(adaptor.calls().is_empty());
}

#[tokio::test]
async fn test_unusable_lease_falls_back_to_default() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let (adaptor, _events) = MockAdaptor::new(HookSet::none());
    let hub = test_hub(Arc::new(adaptor));

    let response = hub.handle(form_request(&subscribe_pairs(&callback, "soon"))).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let challenge = subscriber.next_request().await.expect("challenge not received");
    assert_eq!(
        challenge.get(HUB_LEASE_SECONDS),
        Some(&DEFAULT_LEASE_SECONDS.to_string())
    );
}

#[tokio::test]
async fn test_rejected_validation_sends_denial_and_no_challenge() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let hooks = HookSet::none()
        .with(Hook::SubscriptionValidation)
        .with(Hook::SubscriptionIntentVerified);
    let (adaptor, _events) = MockAdaptor::new(hooks);
    let adaptor =
        Arc::new(adaptor.with_validation_reply(Err(HookError::new("Callback is blocklisted"))));
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub.handle(form_request(&subscribe_pairs(&callback, "3600"))).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let notice = subscriber.next_request().await.expect("denial not received");
    assert_eq!(notice.get(HUB_MODE).map(String::as_str), Some("denied"));
    assert_eq!(notice.get(HUB_TOPIC).map(String::as_str), Some("news"));
    assert_eq!(
        notice.get(HUB_REASON).map(String::as_str),
        Some("Callback is blocklisted")
    );
    assert!(!notice.contains_key(HUB_CHALLENGE));

    assert!(subscriber.stays_silent().await);
    assert_eq!(
        adaptor.count(|call| matches!(call, HookCall::SubscriptionIntentVerified(_))),
        0
    );
}

#[tokio::test]
async fn test_unsubscription_is_verified_without_lease() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let hooks = HookSet::none()
        .with(Hook::Unsubscription)
        .with(Hook::UnsubscriptionValidation)
        .with(Hook::UnsubscriptionIntentVerified);
    let (adaptor, mut events) = MockAdaptor::new(hooks);
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub
        .handle(form_request(&[
            (HUB_MODE, "unsubscribe"),
            (HUB_TOPIC, "news"),
            (HUB_CALLBACK, callback.as_str()),
        ]))
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let challenge = subscriber.next_request().await.expect("challenge not received");
    assert_eq!(challenge.get(HUB_MODE).map(String::as_str), Some("unsubscribe"));
    assert!(!challenge.contains_key(HUB_LEASE_SECONDS));

    assert!(matches!(
        recv_within(&mut events, EXPECT_WITHIN).await,
        Some(HookCall::Unsubscription(_))
    ));
    assert!(matches!(
        recv_within(&mut events, EXPECT_WITHIN).await,
        Some(HookCall::UnsubscriptionValidation(_))
    ));
    match recv_within(&mut events, EXPECT_WITHIN).await {
        Some(HookCall::UnsubscriptionIntentVerified(message)) => {
            assert_eq!(message.topic(), "news");
            assert_eq!(message.callback(), callback);
        }
        other => panic!("Unexpected hook call: {:?}", other),
    }
}

#[tokio::test]
async fn test_publish_with_query_parameters() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::none());
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let request = HubRequest::default()
        .with_content_type("application/json; charset=utf-8")
        .with_query(encode(&[(HUB_MODE, "publish"), (HUB_TOPIC, "news")]))
        .with_body(r#"{"headline":"hello"}"#);
    let response = hub.handle(request).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    match &adaptor.calls()[..] {
        [HookCall::Update(message)] => {
            assert_eq!(message.kind(), UpdateKind::Publish);
            assert_eq!(message.topic(), "news");
            assert_eq!(message.content_type(), Some("application/json; charset=utf-8"));
            assert_eq!(&message.content()[..], br#"{"headline":"hello"}"#);
        }
        other => panic!("Unexpected hook calls: {:?}", other),
    }
}

#[tokio::test]
async fn test_form_publish_and_event_kinds() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::none());
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let publish = HubRequest::form("title=hello")
        .with_header(HeaderName::from_static(PUBLISHER_HEADER), PUBLISHER_PUBLISH)
        .with_query(encode(&[(HUB_MODE, "publish"), (HUB_TOPIC, "news")]));
    let event = form_request(&[(HUB_MODE, "publish"), (HUB_TOPIC, "news"), ("title", "hi")]);

    assert_eq!(hub.handle(publish).await.status(), StatusCode::ACCEPTED);
    assert_eq!(hub.handle(event).await.status(), StatusCode::ACCEPTED);

    let kinds: Vec<UpdateKind> = adaptor
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            HookCall::Update(message) => Some(message.kind()),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![UpdateKind::Publish, UpdateKind::Event]);
}

#[tokio::test]
async fn test_publish_hook_error_is_bad_request() {
    let (adaptor, _events) = MockAdaptor::new(HookSet::none());
    let adaptor = Arc::new(adaptor.with_update_reply(Err(HookError::new("Topic not registered"))));
    let hub = test_hub(adaptor);

    let request = HubRequest::default()
        .with_content_type("text/plain")
        .with_query(encode(&[(HUB_MODE, "publish"), (HUB_TOPIC, "news")]))
        .with_body("hello");
    let response = hub.handle(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Topic not registered");
}

#[tokio::test]
async fn test_sequential_adaptor_runs_full_subscription_flow() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let (adaptor, mut events) = MockAdaptor::new(HookSet::all());
    let adaptor = Arc::new(adaptor.with_concurrency(Concurrency::Sequential));
    let hub = test_hub(Arc::clone(&adaptor));

    let requests = (0..3).map(|_| {
        let hub = hub.clone();
        let request = form_request(&subscribe_pairs(&callback, "3600"));
        tokio::spawn(async move { hub.handle(request).await })
    });
    for handle in requests.collect::<Vec<_>>() {
        assert_eq!(handle.await.unwrap().status(), StatusCode::ACCEPTED);
    }

    for _ in 0..3 {
        assert!(subscriber.next_request().await.is_some());
    }

    let mut confirmed = 0;
    while confirmed < 3 {
        match recv_within(&mut events, EXPECT_WITHIN).await {
            Some(HookCall::SubscriptionIntentVerified(_)) => confirmed += 1,
            Some(_) => {}
            None => panic!("Only {} subscriptions confirmed", confirmed),
        }
    }
}

fn unsubscribe_request(callback: &str) -> HubRequest {
    form_request(&[
        (HUB_MODE, "unsubscribe"),
        (HUB_TOPIC, "news"),
        (HUB_CALLBACK, callback),
    ])
}

#[tokio::test]
async fn test_unsubscription_without_hook_is_accepted_and_verified() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let (adaptor, mut events) =
        MockAdaptor::new(HookSet::none().with(Hook::UnsubscriptionIntentVerified));
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub.handle(unsubscribe_request(&callback)).await;
    assert_eq!(response, HubResponse::accepted());

    let challenge = subscriber.next_request().await.expect("challenge not received");
    assert_eq!(challenge.get(HUB_MODE).map(String::as_str), Some("unsubscribe"));
    assert!(matches!(
        recv_within(&mut events, EXPECT_WITHIN).await,
        Some(HookCall::UnsubscriptionIntentVerified(_))
    ));
    assert_eq!(adaptor.count(|call| matches!(call, HookCall::Unsubscription(_))), 0);
}

#[tokio::test]
async fn test_non_accepted_unsubscription_response_skips_verification() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let hooks = HookSet::none()
        .with(Hook::Unsubscription)
        .with(Hook::UnsubscriptionIntentVerified);
    let (adaptor, _events) = MockAdaptor::new(hooks);
    let adaptor =
        Arc::new(adaptor.with_unsubscription_reply(Ok(HubResponse::ok().with_text("gone"))));
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub.handle(unsubscribe_request(&callback)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "gone");
    assert!(subscriber.stays_silent().await);
    assert_eq!(adaptor.calls().len(), 1);
}

#[tokio::test]
async fn test_unsubscription_hook_error_is_bad_request() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let (adaptor, _events) = MockAdaptor::new(HookSet::none().with(Hook::Unsubscription));
    let adaptor =
        Arc::new(adaptor.with_unsubscription_reply(Err(HookError::new("Not subscribed"))));
    let hub = test_hub(adaptor);

    let response = hub.handle(unsubscribe_request(&callback)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text(), "Not subscribed");
    assert!(subscriber.stays_silent().await);
}

#[tokio::test]
async fn test_rejected_unsubscription_validation_sends_denial() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();

    let hooks = HookSet::none()
        .with(Hook::UnsubscriptionValidation)
        .with(Hook::UnsubscriptionIntentVerified);
    let (adaptor, _events) = MockAdaptor::new(hooks);
    let adaptor =
        Arc::new(adaptor.with_validation_reply(Err(HookError::new("Subscription is locked"))));
    let hub = test_hub(Arc::clone(&adaptor));

    let response = hub.handle(unsubscribe_request(&callback)).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let notice = subscriber.next_request().await.expect("denial not received");
    assert_eq!(notice.get(HUB_MODE).map(String::as_str), Some("denied"));
    assert_eq!(notice.get(HUB_TOPIC).map(String::as_str), Some("news"));
    assert_eq!(
        notice.get(HUB_REASON).map(String::as_str),
        Some("Subscription is locked")
    );
    assert!(!notice.contains_key(HUB_CHALLENGE));

    assert!(subscriber.stays_silent().await);
    assert_eq!(
        adaptor.count(|call| matches!(call, HookCall::UnsubscriptionIntentVerified(_))),
        0
    );
}

#[tokio::test]
async fn test_hooks_receive_request_headers() {
    let mut subscriber = SubscriberStub::start(CallbackBehavior::Echo).await;
    let callback = subscriber.callback_url();
    let request_id = HeaderName::from_static("x-request-id");

    let (adaptor, mut events) =
        MockAdaptor::new(HookSet::none().with(Hook::SubscriptionIntentVerified));
    let adaptor = Arc::new(adaptor);
    let hub = test_hub(Arc::clone(&adaptor));

    let register = form_request(&[(HUB_MODE, "register"), (HUB_TOPIC, "news")])
        .with_header(request_id.clone(), "register-1");
    let publish = HubRequest::default()
        .with_content_type("text/plain")
        .with_header(request_id.clone(), "publish-1")
        .with_query(encode(&[(HUB_MODE, "publish"), (HUB_TOPIC, "news")]))
        .with_body("hello");
    let subscribe =
        form_request(&subscribe_pairs(&callback, "3600")).with_header(request_id.clone(), "sub-1");

    assert_eq!(hub.handle(register).await.status(), StatusCode::OK);
    assert_eq!(hub.handle(publish).await.status(), StatusCode::ACCEPTED);
    assert_eq!(hub.handle(subscribe).await.status(), StatusCode::ACCEPTED);

    assert!(subscriber.next_request().await.is_some());
    loop {
        match recv_within(&mut events, EXPECT_WITHIN).await {
            Some(HookCall::SubscriptionIntentVerified(_)) => break,
            Some(_) => {}
            None => panic!("Subscription was never confirmed"),
        }
    }

    let seen = |predicate: fn(&HookCall) -> bool| -> Vec<String> {
        adaptor
            .headers_of(predicate)
            .iter()
            .map(|headers| headers.get(&request_id).unwrap().to_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(seen(|call| matches!(call, HookCall::Register(_))), ["register-1"]);
    assert_eq!(seen(|call| matches!(call, HookCall::Update(_))), ["publish-1"]);
    assert_eq!(
        seen(|call| matches!(call, HookCall::SubscriptionIntentVerified(_))),
        ["sub-1"]
    );
}

mod properties {
    use super::*;
    use proptest::prelude::*;
    use websub_hub::Mode;

    proptest! {
        /// Any `hub.mode` outside the five known values is a 400 and never
        /// reaches the adaptor.
        #[test]
        fn test_unknown_modes_never_reach_adaptor(mode in "[a-zA-Z_.]{0,16}") {
            prop_assume!(Mode::ALL.iter().all(|known| known.as_str() != mode));

            tokio_test::block_on(async {
                let (adaptor, _events) = MockAdaptor::new(HookSet::all());
                let adaptor = Arc::new(adaptor);
                let hub = test_hub(Arc::clone(&adaptor));

                let response = hub
                    .handle(form_request(&[(HUB_MODE, mode.as_str()), (HUB_TOPIC, "news")]))
                    .await;

                prop_assert_eq!(response.status(), StatusCode::BAD_REQUEST);
                prop_assert_eq!(response.text(), INVALID_MODE_MESSAGE);
                prop_assert!(adaptor.calls().is_empty());
                Ok(())
            })?;
        }
    }
}

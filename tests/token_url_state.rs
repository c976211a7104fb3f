use rica::core::selection::SelectionSource;
use rica::core::token::{TokenFormat, UrlState, decode_token, encode_token};

#[test]
fn tokens_encode_and_decode() {
    assert_eq!(encode_token(2), "ica_002");
    assert_eq!(encode_token(123), "ica_123");
    assert_eq!(encode_token(1234), "ica_1234");
    for id in [0, 7, 42, 999] {
        assert_eq!(decode_token(&encode_token(id)), Some(id));
    }
    assert_eq!(decode_token("ICA_07"), Some(7));
    assert_eq!(decode_token(" 12 "), Some(12));
    assert_eq!(decode_token("ica_"), None);
    assert_eq!(decode_token("ica_x1"), None);
}

#[test]
fn query_parsing_keeps_order_and_skips_garbage() {
    let state = UrlState::parse_query("?selected=ica_004%2Cbogus,ica_001&selected_source=table&x=1");
    assert_eq!(state.selected, vec![4, 1]);
    assert_eq!(state.first(), Some(4));
    assert_eq!(state.source, Some(SelectionSource::Table));

    let empty = UrlState::parse_query("");
    assert!(empty.selected.is_empty());
    assert_eq!(empty.first(), None);
}

#[test]
fn query_written_by_the_host_parses_back() {
    let format = TokenFormat::default();
    let state = UrlState::new(Some(9), SelectionSource::EmbeddedView);
    let query = state.to_query(&format);
    assert_eq!(query, "selected=ica_009&selected_source=bokeh");
    assert_eq!(UrlState::parse_query(&query), state);

    // Url and None carry no provenance tag.
    let from_url = UrlState::new(Some(9), SelectionSource::Url).to_query(&format);
    assert_eq!(from_url, "selected=ica_009");
}

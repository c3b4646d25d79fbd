mod search_flow;
mod sync_flow;
mod typesense_http;

pub mod segment_store_admin {
    tonic::include_proto!("segment_store_admin");
}

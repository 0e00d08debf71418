use article_shorts::serve::StaticServer;

#[tokio::test]
async fn serves_files_from_directory_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("video.mp4"), b"encoded video").unwrap();

    let server = StaticServer::start(dir.path(), 0).await.unwrap();
    let url = server.url_for("video.mp4");
    assert_eq!(url, format!("http://127.0.0.1:{}/video.mp4", server.addr().port()));

    let body = reqwest::get(&url).await.unwrap().bytes().await.unwrap();
    assert_eq!(&body[..], b"encoded video");

    let missing = reqwest::get(format!("http://{}/nope.mp4", server.addr())).await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    drop(missing);

    let addr = server.addr();
    server.shutdown().await.unwrap();
    assert!(reqwest::get(format!("http://{addr}/video.mp4")).await.is_err());
}

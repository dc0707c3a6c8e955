//! Offline fallback page, served when a navigation has nothing else to show.

pub const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>OtakuDB - Hors ligne</title>
  <style>
    body { margin: 0; min-height: 100vh; display: flex; align-items: center; justify-content: center;
           font-family: system-ui, sans-serif; background: #0f0f17; color: #e6e6f0; text-align: center; }
    main { padding: 2rem; max-width: 28rem; }
    h1 { font-size: 1.5rem; margin-bottom: 0.5rem; }
    p { color: #a0a0b8; line-height: 1.5; }
    button { margin-top: 1.5rem; padding: 0.75rem 1.5rem; border: 0; border-radius: 0.5rem;
             background: #7c3aed; color: #fff; font-size: 1rem; cursor: pointer; }
  </style>
</head>
<body>
  <main>
    <h1>Mode Hors Ligne</h1>
    <p>Vous n'êtes pas connecté à Internet. Les pages déjà consultées restent disponibles.</p>
    <button onclick="window.location.reload()">Réessayer</button>
  </main>
</body>
</html>
"#;
